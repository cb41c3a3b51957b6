//! Routes execute commands to the handler registered under their id.

use std::sync::Arc;

use serde_json::Value;
use tether_proto::{EventKind, ExecuteCommand, InvocationIds, RegistrationId};

use crate::error::BridgeError;
use crate::executor::{Channel, EventExecutor, Executors, Invoke};
use crate::handler::{HandlerFuture, HandlerResult};
use crate::registry::SharedRegistry;
use crate::task;

/// Routes execute commands by event kind.
///
/// Cheap to clone; every clone shares the registry and channel. The
/// dispatcher does not check that setup has finished.
#[derive(Debug, Clone)]
pub struct Dispatcher {
	registry: SharedRegistry,
	channel: Channel,
	executors: Executors,
}

impl Dispatcher {
	/// Creates a dispatcher over `registry`, reporting on `channel`.
	pub fn new(registry: SharedRegistry, channel: Channel, executors: Executors) -> Self {
		Self {
			registry,
			channel,
			executors,
		}
	}

	/// Binds `(id, args)` to a call of the registered callable.
	///
	/// An id with no callable resolves to [`BridgeError::UnknownRegistration`].
	pub fn invoke(&self) -> Invoke {
		let registry = Arc::clone(&self.registry);
		Arc::new(move |id: RegistrationId, args: Vec<Value>| -> HandlerFuture {
			let callable = registry.lock().callable(id);
			match callable {
				Some(f) => f(args),
				None => {
					let missing: HandlerResult = Err(BridgeError::UnknownRegistration { id }.into());
					Box::pin(std::future::ready(missing))
				}
			}
		})
	}

	/// Executes one command and waits until its outcome has been reported.
	pub async fn execute(&self, cmd: ExecuteCommand) {
		let ExecuteCommand { event, ids, args } = cmd;
		let Some(kind) = EventKind::parse(&event) else {
			tracing::warn!(event = %event, id = ids.id.0, "dispatch.unknown_event");
			return;
		};
		tracing::debug!(event = kind.as_str(), id = ids.id.0, invocation = ?ids.invocation_id, "dispatch.execute");

		match kind {
			EventKind::DevServerStart => self.delegate(&self.executors.dev_server, ids, args).await,
			EventKind::FilePreprocessor => self.delegate(&self.executors.preprocessor, ids, args).await,
			EventKind::BeforeBrowserLaunch => self.delegate(&self.executors.browser_launch, ids, args).await,
			EventKind::BeforeRun
			| EventKind::BeforeSpec
			| EventKind::AfterRun
			| EventKind::AfterSpec
			| EventKind::AfterScreenshot => self.delegate(&self.executors.generic, ids, args).await,
			EventKind::Task => task::task_execute(&self.registry, &self.channel, ids, args).await,
			EventKind::GetTaskKeys => task::task_get_keys(&self.registry, &self.channel, ids).await,
			EventKind::GetTaskBody => task::task_get_body(&self.registry, &self.channel, ids, args).await,
		}
	}

	async fn delegate(&self, executor: &Arc<dyn EventExecutor>, ids: InvocationIds, args: Vec<Value>) {
		executor.execute(&self.channel, self.invoke(), ids, args).await;
	}

	/// Registry the dispatcher reads from.
	pub fn registry(&self) -> &SharedRegistry {
		&self.registry
	}
}
