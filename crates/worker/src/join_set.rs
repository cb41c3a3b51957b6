use std::future::Future;

use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

use crate::TaskClass;

/// Runtime-aware wrapper for a Tokio [`JoinSet`].
///
/// The bridge keeps one of these per session so it can wait for every
/// in-flight invocation before shutting down.
#[derive(Debug)]
pub struct WorkerJoinSet<T> {
	class: TaskClass,
	inner: JoinSet<T>,
}

impl<T> WorkerJoinSet<T>
where
	T: Send + 'static,
{
	/// Creates an empty worker join set for the given task class.
	pub fn new(class: TaskClass) -> Self {
		Self { class, inner: JoinSet::new() }
	}

	/// Returns the number of tasks currently in the set.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` if the set is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Spawns a future into the set on the current worker runtime handle.
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.spawn");
		let handle = crate::spawn::runtime_handle();
		self.inner.spawn_on(fut.instrument(crate::spawn::span(self.class)), &handle);
	}

	/// Waits for the next completed task.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}

	/// Returns one ready completion without waiting.
	pub fn try_join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.try_join_next()
	}

	/// Waits for every task in the set, returning how many finished.
	pub async fn drain(&mut self) -> usize {
		let mut completed = 0;
		while let Some(result) = self.inner.join_next().await {
			if let Err(err) = result
				&& let Some(msg) = crate::join_error_panic_message(err)
			{
				tracing::error!(worker_class = self.class.as_str(), panic = %msg, "worker.join_set.panicked");
			}
			completed += 1;
		}
		completed
	}
}
