//! `task` execution and the two task introspection events.
//!
//! Lookups happen under the registry lock; the chosen task runs after the
//! lock is released.

use serde_json::Value;
use tether_proto::{InvocationIds, sentinel};

use crate::executor::{Channel, wrap};
use crate::handler::TaskEntry;
use crate::registry::SharedRegistry;

fn task_name(args: &[Value]) -> String {
	match args.first() {
		Some(Value::String(name)) => name.clone(),
		Some(other) => other.to_string(),
		None => String::new(),
	}
}

/// Runs the task named by `args[0]` with the argument in `args[1]`.
///
/// Unknown names and non-callable entries resolve to the unhandled-task
/// marker rather than an error.
pub async fn task_execute(registry: &SharedRegistry, channel: &Channel, ids: InvocationIds, args: Vec<Value>) {
	let name = task_name(&args);
	let arg = sentinel::decode_task_arg(args.into_iter().nth(1));
	let entry = registry.lock().task_entry(&name);

	match entry {
		Some(TaskEntry::Callable(task)) => {
			tracing::debug!(task = %name, "task.execute");
			wrap(channel, &ids, async move { task.call(arg).await }).await;
		}
		Some(TaskEntry::Value(_)) | None => {
			tracing::debug!(task = %name, "task.unhandled");
			wrap(channel, &ids, std::future::ready(Ok(Some(sentinel::unhandled_task())))).await;
		}
	}
}

/// Resolves to the registered task names, in registration order.
pub async fn task_get_keys(registry: &SharedRegistry, channel: &Channel, ids: InvocationIds) {
	let keys = registry.lock().task_keys();
	wrap(channel, &ids, std::future::ready(Ok(Some(Value::from(keys))))).await;
}

/// Resolves to the source text of the task named by `args[0]`.
pub async fn task_get_body(registry: &SharedRegistry, channel: &Channel, ids: InvocationIds, args: Vec<Value>) {
	let body = registry.lock().task_body(&task_name(&args));
	wrap(channel, &ids, std::future::ready(Ok(Some(Value::String(body))))).await;
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;
	use tether_proto::{BridgeMessage, EventKind, RegistrationId};
	use tether_rpc::outbound_channel;

	use super::*;
	use crate::handler::{EventHandler, TaskFn};
	use crate::registry::EventRegistry;

	fn registry_with_tasks() -> SharedRegistry {
		let registry = EventRegistry::shared();
		let echo = TaskFn::new(|arg| async move { Ok(arg) }).with_body("(arg) => arg");
		registry
			.lock()
			.register(
				EventKind::Task,
				EventHandler::tasks([("echo", TaskEntry::from(echo)), ("flag", TaskEntry::from(json!(true)))]),
			)
			.unwrap();
		registry
	}

	fn exploding_task(_: Option<Value>) -> std::future::Ready<crate::handler::HandlerResult> {
		panic!("task exploded before its future")
	}

	#[tokio::test]
	async fn task_panicking_before_its_future_is_reported() {
		let registry = EventRegistry::shared();
		registry
			.lock()
			.register(EventKind::Task, EventHandler::tasks([("boom", TaskFn::new(exploding_task))]))
			.unwrap();
		let (channel, mut rx) = outbound_channel();
		task_execute(&registry, &channel, InvocationIds::new(RegistrationId(0), "boom"), vec![json!("boom")]).await;

		let Some(BridgeMessage::Outcome(outcome)) = rx.recv().await else {
			panic!("expected an outcome");
		};
		assert_eq!(outcome.invocation_id.0, "boom");
		assert_eq!(outcome.error.and_then(|e| e.code).as_deref(), Some("HANDLER_PANICKED"));
	}

	async fn value_of(rx: &mut tokio::sync::mpsc::UnboundedReceiver<BridgeMessage>) -> Option<Value> {
		match rx.recv().await {
			Some(BridgeMessage::Outcome(outcome)) => {
				assert_eq!(outcome.error, None);
				outcome.value
			}
			other => panic!("expected an outcome, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn no_argument_sentinel_reaches_task_as_undefined() {
		let registry = registry_with_tasks();
		let (channel, mut rx) = outbound_channel();
		let args = vec![json!("echo"), json!(sentinel::TASK_NO_ARGUMENT)];
		task_execute(&registry, &channel, InvocationIds::new(RegistrationId(0), "t1"), args).await;
		assert_eq!(value_of(&mut rx).await, Some(json!(sentinel::UNDEFINED)));

		let args = vec![json!("echo"), json!({ "n": 1 })];
		task_execute(&registry, &channel, InvocationIds::new(RegistrationId(0), "t2"), args).await;
		assert_eq!(value_of(&mut rx).await, Some(json!({ "n": 1 })));
	}

	#[tokio::test]
	async fn unknown_and_plain_entries_are_unhandled() {
		let registry = registry_with_tasks();
		let (channel, mut rx) = outbound_channel();
		for (inv, name) in [("t1", "missing"), ("t2", "flag")] {
			task_execute(&registry, &channel, InvocationIds::new(RegistrationId(0), inv), vec![json!(name)]).await;
			let value = value_of(&mut rx).await.unwrap();
			assert!(sentinel::is_unhandled_task(&value), "{name} should be unhandled");
		}
	}

	#[tokio::test]
	async fn introspection_reports_keys_and_bodies() {
		let registry = registry_with_tasks();
		let (channel, mut rx) = outbound_channel();
		task_get_keys(&registry, &channel, InvocationIds::new(RegistrationId(1), "k")).await;
		assert_eq!(value_of(&mut rx).await, Some(json!(["echo", "flag"])));

		task_get_body(&registry, &channel, InvocationIds::new(RegistrationId(0), "b1"), vec![json!("echo")]).await;
		assert_eq!(value_of(&mut rx).await, Some(json!("(arg) => arg")));

		task_get_body(&registry, &channel, InvocationIds::new(RegistrationId(0), "b2"), vec![json!("flag")]).await;
		assert_eq!(value_of(&mut rx).await, Some(json!("")));
	}

	#[tokio::test]
	async fn keys_are_empty_without_task_registration() {
		let registry = EventRegistry::shared();
		let (channel, mut rx) = outbound_channel();
		task_get_keys(&registry, &channel, InvocationIds::new(RegistrationId(1), "k")).await;
		assert_eq!(value_of(&mut rx).await, Some(json!([])));
	}
}
