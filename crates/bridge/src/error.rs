//! Error kinds raised by the bridge.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde_json::json;
use tether_config::{MigrationError, TestingType};
use tether_proto::{RegistrationId, SerializedError};
use thiserror::Error;

/// Domain errors of the plugin bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
	/// The setup routine registered an event that does not exist.
	#[error("`{event}` is not a valid event name; valid events are: {}", user_events.join(", "))]
	InvalidEventName {
		/// The rejected name.
		event: String,
		/// Names a setup routine may register.
		user_events: Vec<&'static str>,
	},

	/// The handler shape does not fit the event.
	#[error("the handler for `{event}` must be {expected}, got {got}")]
	InvalidEventHandler {
		/// Event being registered.
		event: String,
		/// Shape the event requires.
		expected: &'static str,
		/// Shape that was passed.
		got: &'static str,
	},

	/// `dev-server:start` was registered twice in one session.
	#[error("`dev-server:start` can only be registered once per session")]
	DevServerAlreadyRegistered,

	/// Setup was requested again on a session that already ran it.
	#[error("setup already ran for this session")]
	SetupAlreadyRan,

	/// The setup routine itself failed.
	#[error("the setup routine in {} failed while setting up {testing_type}: {source:#}", config_file.display())]
	SetupFailed {
		/// User configuration file.
		config_file: PathBuf,
		/// Testing type being set up.
		testing_type: TestingType,
		/// Whatever the routine raised.
		#[source]
		source: anyhow::Error,
	},

	/// A migrated configuration option was written or returned.
	#[error(transparent)]
	MigratedOption(#[from] MigrationError),

	/// Several task registrations bound the same names. Non-fatal.
	#[error("duplicate task keys registered, later handlers win: {}", keys.join(", "))]
	DuplicateTaskKeys {
		/// Task names bound more than once.
		keys: Vec<String>,
	},

	/// An execute command referenced an id setup never produced.
	#[error("no handler is registered with id {}", id.0)]
	UnknownRegistration {
		/// The unknown id.
		id: RegistrationId,
	},

	/// A handler panicked instead of returning.
	#[error("handler panicked: {message}")]
	HandlerPanicked {
		/// Panic payload message.
		message: String,
	},
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
	/// Stable kind code sent over the wire.
	pub fn code(&self) -> &'static str {
		match self {
			Self::InvalidEventName { .. } => "INVALID_EVENT_NAME",
			Self::InvalidEventHandler { .. } => "INVALID_EVENT_HANDLER",
			Self::DevServerAlreadyRegistered => "DEV_SERVER_ALREADY_REGISTERED",
			Self::SetupAlreadyRan => "SETUP_ALREADY_RAN",
			Self::SetupFailed { .. } => "SETUP_ROUTINE_FAILED",
			Self::MigratedOption(_) => "MIGRATED_OPTION",
			Self::DuplicateTaskKeys { .. } => "DUPLICATE_TASK_KEY",
			Self::UnknownRegistration { .. } => "UNKNOWN_REGISTRATION",
			Self::HandlerPanicked { .. } => "HANDLER_PANICKED",
		}
	}

	/// Error name sent over the wire.
	pub fn name(&self) -> &'static str {
		match self {
			Self::InvalidEventName { .. } => "InvalidEventNameError",
			Self::InvalidEventHandler { .. } => "InvalidEventHandlerError",
			Self::DevServerAlreadyRegistered => "DevServerAlreadyRegisteredError",
			Self::SetupAlreadyRan => "SetupAlreadyRanError",
			Self::SetupFailed { .. } => "SetupRoutineError",
			Self::MigratedOption(_) => "MigratedOptionError",
			Self::DuplicateTaskKeys { .. } => "DuplicateTaskKeyWarning",
			Self::UnknownRegistration { .. } => "UnknownRegistrationError",
			Self::HandlerPanicked { .. } => "HandlerPanicError",
		}
	}

	fn details(&self) -> Option<serde_json::Value> {
		match self {
			Self::InvalidEventName { event, user_events } => Some(json!({ "event": event, "userEvents": user_events })),
			Self::InvalidEventHandler { event, expected, got } => {
				Some(json!({ "event": event, "expected": expected, "got": got }))
			}
			Self::SetupFailed {
				config_file,
				testing_type,
				..
			} => Some(json!({ "configFile": config_file, "testingType": testing_type })),
			Self::MigratedOption(err) => Some(json!({ "path": err.path() })),
			Self::DuplicateTaskKeys { keys } => Some(json!({ "keys": keys })),
			Self::UnknownRegistration { id } => Some(json!({ "id": id })),
			Self::DevServerAlreadyRegistered | Self::SetupAlreadyRan | Self::HandlerPanicked { .. } => None,
		}
	}

	fn stack(&self) -> Option<String> {
		match self {
			Self::MigratedOption(err) => Some(err.trace()),
			Self::SetupFailed { source, .. } => Some(render_chain(source)),
			_ => None,
		}
	}

	/// Wire form of this error.
	pub fn to_serialized(&self) -> SerializedError {
		SerializedError {
			name: self.name().to_string(),
			message: self.to_string(),
			stack: self.stack(),
			code: Some(self.code().to_string()),
			details: self.details(),
		}
	}
}

/// Wire form of any error raised by user code or the bridge.
///
/// Domain errors keep their kind; everything else is reported as a plain
/// `Error` with the cause chain rendered into `stack`.
pub fn serialize_error(err: &anyhow::Error) -> SerializedError {
	if let Some(domain) = err.downcast_ref::<BridgeError>() {
		return domain.to_serialized();
	}
	if let Some(migration) = err.downcast_ref::<MigrationError>() {
		return SerializedError {
			name: "MigratedOptionError".to_string(),
			message: migration.to_string(),
			stack: Some(migration.trace()),
			code: Some("MIGRATED_OPTION".to_string()),
			details: Some(json!({ "path": migration.path() })),
		};
	}
	SerializedError {
		name: "Error".to_string(),
		message: err.to_string(),
		stack: Some(render_chain(err)),
		code: None,
		details: None,
	}
}

fn render_chain(err: &anyhow::Error) -> String {
	let mut out = format!("Error: {err}");
	for cause in err.chain().skip(1) {
		let _ = write!(out, "\n    caused by: {cause}");
	}
	out
}
