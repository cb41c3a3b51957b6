//! Invoke-and-report: how a handler's result reaches the host.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tether_proto::{BridgeMessage, InvocationIds, InvocationOutcome, RegistrationId};
use tether_rpc::PeerSocket;
use tether_worker::TaskClass;

use crate::error::{BridgeError, serialize_error};
use crate::handler::{HandlerFuture, HandlerResult};

/// Outbound channel to the host.
pub type Channel = PeerSocket<BridgeMessage>;

/// Bound lookup-and-call for a registration id.
pub type Invoke = Arc<dyn Fn(RegistrationId, Vec<Value>) -> HandlerFuture + Send + Sync>;

/// Runs `fut` in isolation and reports how it settled.
///
/// A panic is caught and reported as an error for this invocation only.
/// Handler calls must happen inside `fut`, so a handler that panics before
/// returning its future is caught too.
/// Without an invocation id the future still runs, but nothing is sent.
pub async fn wrap<F>(channel: &Channel, ids: &InvocationIds, fut: F)
where
	F: Future<Output = HandlerResult> + Send + 'static,
{
	let settled = match tether_worker::spawn(TaskClass::Invocation, fut).await {
		Ok(result) => result,
		Err(err) => {
			let message = tether_worker::join_error_panic_message(err).unwrap_or_else(|| "invocation was cancelled".to_string());
			tracing::error!(id = ids.id.0, panic = %message, "invocation.panicked");
			Err(BridgeError::HandlerPanicked { message }.into())
		}
	};

	let Some(invocation_id) = ids.invocation_id.clone() else {
		match settled {
			Ok(_) => tracing::warn!(id = ids.id.0, "invocation.no_invocation_id"),
			Err(err) => tracing::warn!(id = ids.id.0, error = %err, "invocation.no_invocation_id"),
		}
		return;
	};

	let outcome = match settled {
		Ok(value) => InvocationOutcome::fulfilled(invocation_id, value),
		Err(err) => {
			tracing::debug!(id = ids.id.0, error = %err, "invocation.rejected");
			InvocationOutcome::rejected(invocation_id, serialize_error(&err))
		}
	};
	if channel.send(BridgeMessage::Outcome(outcome)).is_err() {
		tracing::warn!(id = ids.id.0, "invocation.channel_closed");
	}
}

/// Runs one event kind's handler and reports the outcome on `channel`.
#[async_trait]
pub trait EventExecutor: Send + Sync {
	/// Executes the registration named by `ids` with `args`.
	async fn execute(&self, channel: &Channel, invoke: Invoke, ids: InvocationIds, args: Vec<Value>);
}

/// Generic executor: invoke, await, report.
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapExecutor;

#[async_trait]
impl EventExecutor for WrapExecutor {
	async fn execute(&self, channel: &Channel, invoke: Invoke, ids: InvocationIds, args: Vec<Value>) {
		let id = ids.id;
		wrap(channel, &ids, async move { invoke(id, args).await }).await;
	}
}

/// `before:browser:launch` executor.
///
/// Arguments are `[browser, launch_options]`. A handler that returns
/// undefined keeps the launch options it was given.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserLaunchExecutor;

#[async_trait]
impl EventExecutor for BrowserLaunchExecutor {
	async fn execute(&self, channel: &Channel, invoke: Invoke, ids: InvocationIds, args: Vec<Value>) {
		let launch_options = args.get(1).cloned();
		let id = ids.id;
		wrap(channel, &ids, async move {
			let result: HandlerResult = invoke(id, args).await;
			result.map(|value| value.or(launch_options))
		})
		.await;
	}
}

/// Executors for the event kinds routed outside the bridge.
#[derive(Clone)]
pub struct Executors {
	/// `dev-server:start`.
	pub dev_server: Arc<dyn EventExecutor>,
	/// `file:preprocessor`.
	pub preprocessor: Arc<dyn EventExecutor>,
	/// `before:browser:launch`.
	pub browser_launch: Arc<dyn EventExecutor>,
	/// Every other user lifecycle event.
	pub generic: Arc<dyn EventExecutor>,
}

impl Default for Executors {
	fn default() -> Self {
		Self {
			dev_server: Arc::new(WrapExecutor),
			preprocessor: Arc::new(WrapExecutor),
			browser_launch: Arc::new(BrowserLaunchExecutor),
			generic: Arc::new(WrapExecutor),
		}
	}
}

impl std::fmt::Debug for Executors {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Executors").finish_non_exhaustive()
	}
}
