//! Lifecycle event names understood by the bridge.

use std::fmt;

/// Every event kind the bridge can register or execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	/// Boots the component dev server. At most one binding per session.
	DevServerStart,
	/// Turns a spec file into a runnable bundle.
	FilePreprocessor,
	/// Adjusts browser launch options.
	BeforeBrowserLaunch,
	/// Runs before the whole run starts.
	BeforeRun,
	/// Runs before each spec.
	BeforeSpec,
	/// Runs after the whole run.
	AfterRun,
	/// Runs after each spec.
	AfterSpec,
	/// Runs after a screenshot is taken.
	AfterScreenshot,
	/// Named tasks callable from tests.
	Task,
	/// Internal: list the registered task names.
	GetTaskKeys,
	/// Internal: fetch the source text of one task.
	GetTaskBody,
}

impl EventKind {
	/// Events a user setup routine may register, in documentation order.
	pub const USER_EVENTS: &'static [EventKind] = &[
		Self::AfterRun,
		Self::AfterScreenshot,
		Self::AfterSpec,
		Self::BeforeBrowserLaunch,
		Self::BeforeRun,
		Self::BeforeSpec,
		Self::DevServerStart,
		Self::FilePreprocessor,
		Self::Task,
	];

	/// Returns the wire name of this event.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::DevServerStart => "dev-server:start",
			Self::FilePreprocessor => "file:preprocessor",
			Self::BeforeBrowserLaunch => "before:browser:launch",
			Self::BeforeRun => "before:run",
			Self::BeforeSpec => "before:spec",
			Self::AfterRun => "after:run",
			Self::AfterSpec => "after:spec",
			Self::AfterScreenshot => "after:screenshot",
			Self::Task => "task",
			Self::GetTaskKeys => "_get:task:keys",
			Self::GetTaskBody => "_get:task:body",
		}
	}

	/// Parses a wire name. Unknown names yield `None`.
	pub fn parse(name: &str) -> Option<Self> {
		Some(match name {
			"dev-server:start" => Self::DevServerStart,
			"file:preprocessor" => Self::FilePreprocessor,
			"before:browser:launch" => Self::BeforeBrowserLaunch,
			"before:run" => Self::BeforeRun,
			"before:spec" => Self::BeforeSpec,
			"after:run" => Self::AfterRun,
			"after:spec" => Self::AfterSpec,
			"after:screenshot" => Self::AfterScreenshot,
			"task" => Self::Task,
			"_get:task:keys" => Self::GetTaskKeys,
			"_get:task:body" => Self::GetTaskBody,
			_ => return None,
		})
	}

	/// True for protocol events that user code never registers directly.
	pub const fn is_internal(self) -> bool {
		matches!(self, Self::GetTaskKeys | Self::GetTaskBody)
	}

	/// Wire names of [`Self::USER_EVENTS`].
	pub fn user_event_names() -> Vec<&'static str> {
		Self::USER_EVENTS.iter().map(|kind| kind.as_str()).collect()
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
