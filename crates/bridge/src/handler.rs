//! Handler shapes a setup routine can register.
//!
//! Every handler is asynchronous and returns `Option<Value>`, where `None`
//! plays the role of "returned undefined".

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

/// Result of one handler call.
pub type HandlerResult = anyhow::Result<Option<Value>>;

/// A boxed future that resolves to a [`HandlerResult`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// Event handler taking the positional arguments of an execute command.
pub type HandlerFn = Arc<dyn Fn(Vec<Value>) -> HandlerFuture + Send + Sync>;

/// Wraps an async closure as a [`HandlerFn`].
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
	F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = HandlerResult> + Send + 'static,
{
	Arc::new(move |args| -> HandlerFuture { Box::pin(f(args)) })
}

/// A handler that does nothing and returns undefined.
pub fn noop_handler() -> HandlerFn {
	handler(|_| async { Ok(None) })
}

/// One callable entry of the task map.
#[derive(Clone)]
pub struct TaskFn {
	call: Arc<dyn Fn(Option<Value>) -> HandlerFuture + Send + Sync>,
	body: Option<String>,
}

impl std::fmt::Debug for TaskFn {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TaskFn")
			.field("call", &"<fn>")
			.field("body", &self.body)
			.finish()
	}
}

impl TaskFn {
	/// Wraps an async closure taking the single, optional task argument.
	pub fn new<F, Fut>(f: F) -> Self
	where
		F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = HandlerResult> + Send + 'static,
	{
		Self {
			call: Arc::new(move |arg| -> HandlerFuture { Box::pin(f(arg)) }),
			body: None,
		}
	}

	/// Attaches the source text reported by task introspection.
	#[must_use]
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());
		self
	}

	/// Calls the task with its decoded argument.
	pub fn call(&self, arg: Option<Value>) -> HandlerFuture {
		(self.call)(arg)
	}

	/// Source text of the task, if one was attached.
	pub fn body(&self) -> Option<&str> {
		self.body.as_deref()
	}
}

/// Value stored under one task name.
#[derive(Debug, Clone)]
pub enum TaskEntry {
	/// A task that can be invoked.
	Callable(TaskFn),
	/// Anything else the user put in the map. Never invoked.
	Value(Value),
}

impl From<TaskFn> for TaskEntry {
	fn from(task: TaskFn) -> Self {
		Self::Callable(task)
	}
}

impl From<Value> for TaskEntry {
	fn from(value: Value) -> Self {
		Self::Value(value)
	}
}

/// Task name to entry, in insertion order.
pub type TaskMap = IndexMap<String, TaskEntry>;

/// What a registration call hands to the registry.
#[derive(Clone)]
pub enum EventHandler {
	/// Plain async callable.
	Callable(HandlerFn),
	/// Task map, only valid for the `task` event.
	Tasks(TaskMap),
}

impl std::fmt::Debug for EventHandler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Callable(_) => f.write_str("Callable(<fn>)"),
			Self::Tasks(tasks) => f.debug_tuple("Tasks").field(&tasks.keys().collect::<Vec<_>>()).finish(),
		}
	}
}

impl EventHandler {
	/// Wraps an async closure.
	pub fn callable<F, Fut>(f: F) -> Self
	where
		F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = HandlerResult> + Send + 'static,
	{
		Self::Callable(handler(f))
	}

	/// Builds a task map from `(name, entry)` pairs.
	pub fn tasks<I, K, E>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, E)>,
		K: Into<String>,
		E: Into<TaskEntry>,
	{
		Self::Tasks(entries.into_iter().map(|(k, e)| (k.into(), e.into())).collect())
	}

	/// Short description of the handler's shape, for validation messages.
	pub fn shape(&self) -> &'static str {
		match self {
			Self::Callable(_) => "function",
			Self::Tasks(_) => "object",
		}
	}
}

impl From<HandlerFn> for EventHandler {
	fn from(handler: HandlerFn) -> Self {
		Self::Callable(handler)
	}
}

impl From<TaskMap> for EventHandler {
	fn from(tasks: TaskMap) -> Self {
		Self::Tasks(tasks)
	}
}
