//! Class-tagged spawning.
//!
//! Work runs inside a `worker` span carrying its [`TaskClass`], so handler
//! logs can be told apart from setup logs without threading context by hand.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::TaskClass;

/// Handle of the ambient runtime, or of a small fallback runtime when the
/// caller is not inside one.
pub(crate) fn runtime_handle() -> Handle {
	if let Ok(handle) = Handle::try_current() {
		return handle;
	}

	static FALLBACK: OnceLock<Runtime> = OnceLock::new();
	FALLBACK
		.get_or_init(|| {
			Builder::new_multi_thread()
				.enable_all()
				.worker_threads(2)
				.thread_name("tether-worker")
				.build()
				.expect("failed to build the tether-worker fallback runtime")
		})
		.handle()
		.clone()
}

pub(crate) fn span(class: TaskClass) -> tracing::Span {
	tracing::debug_span!("worker", class = class.as_str())
}

/// Spawns `fut` inside a span tagged with `class`.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut.instrument(span(class)))
}

/// Runs `f` on the blocking pool inside a span tagged with `class`.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	let span = span(class);
	runtime_handle().spawn_blocking(move || span.in_scope(f))
}
