//! Event-name validation used by the registration callback.

use tether_config::PluginConfig;
use tether_proto::EventKind;

use crate::error::BridgeError;
use crate::handler::EventHandler;

/// Verdict on one registration attempt.
#[derive(Debug)]
pub struct Validation {
	/// True when the registration may proceed.
	pub is_valid: bool,
	/// Names a setup routine may register, present on name errors.
	pub user_events: Option<Vec<&'static str>>,
	/// Why the registration was rejected.
	pub error: Option<BridgeError>,
}

impl Validation {
	/// Accepting verdict.
	pub fn valid() -> Self {
		Self {
			is_valid: true,
			user_events: None,
			error: None,
		}
	}

	/// Rejecting verdict.
	pub fn invalid(error: BridgeError) -> Self {
		let user_events = match &error {
			BridgeError::InvalidEventName { user_events, .. } => Some(user_events.clone()),
			_ => None,
		};
		Self {
			is_valid: false,
			user_events,
			error: Some(error),
		}
	}
}

/// Classifies an event name and handler before registration.
pub trait EventValidator: Send + Sync {
	/// Validates one registration against the session configuration.
	fn validate(&self, event: &str, handler: &EventHandler, config: &PluginConfig) -> Validation;
}

/// Validator over the fixed lifecycle event table.
///
/// Internal protocol events are not user-definable. `task` takes a task
/// map; every other event takes a callable.
#[derive(Debug, Default, Clone, Copy)]
pub struct LifecycleEventValidator;

impl EventValidator for LifecycleEventValidator {
	fn validate(&self, event: &str, handler: &EventHandler, _config: &PluginConfig) -> Validation {
		let Some(kind) = EventKind::parse(event).filter(|kind| !kind.is_internal()) else {
			return Validation::invalid(BridgeError::InvalidEventName {
				event: event.to_string(),
				user_events: EventKind::user_event_names(),
			});
		};

		let expected = match kind {
			EventKind::Task => "object",
			_ => "function",
		};
		if handler.shape() != expected {
			return Validation::invalid(BridgeError::InvalidEventHandler {
				event: event.to_string(),
				expected: if kind == EventKind::Task {
					"an object mapping task names to functions"
				} else {
					"a function"
				},
				got: handler.shape(),
			});
		}

		Validation::valid()
	}
}
