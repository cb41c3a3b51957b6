//! Wire types for the bridge protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sentinel;

/// Stable identifier of one handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub u64);

/// Caller-supplied token correlating an execute command with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(pub String);

impl From<&str> for InvocationId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

/// Serializable view of a registration. The handler itself never crosses the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationProjection {
	/// Wire name of the registered event.
	pub event: String,
	/// Registration id assigned during setup.
	pub id: RegistrationId,
}

/// Target of an execute command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationIds {
	/// Registration to invoke.
	#[serde(rename = "eventId")]
	pub id: RegistrationId,
	/// Correlation token for the outcome, when the host expects one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub invocation_id: Option<InvocationId>,
}

impl InvocationIds {
	/// Ids with a correlation token.
	pub fn new(id: RegistrationId, invocation_id: impl Into<InvocationId>) -> Self {
		Self {
			id,
			invocation_id: Some(invocation_id.into()),
		}
	}
}

/// Request to run a previously registered handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteCommand {
	/// Wire name of the event kind being executed.
	pub event: String,
	/// Registration and correlation ids.
	pub ids: InvocationIds,
	/// Positional arguments, passed to the handler untouched.
	#[serde(default)]
	pub args: Vec<Value>,
}

/// Messages the host sends to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum HostCommand {
	/// Execute one registered handler.
	Execute(ExecuteCommand),
}

/// Error shape that survives serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedError {
	/// Error kind name, `"Error"` for anything without a domain kind.
	pub name: String,
	/// Top-level message.
	pub message: String,
	/// Rendered cause chain or capture site.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
	/// Stable machine-readable kind code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	/// Kind-specific structured data.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

impl SerializedError {
	/// Plain error with only a name and message.
	pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			message: message.into(),
			stack: None,
			code: None,
			details: None,
		}
	}
}

/// Result of one invocation, correlated by the caller's token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationOutcome {
	/// Token copied from the execute command.
	pub invocation_id: InvocationId,
	/// Present when the handler failed.
	pub error: Option<SerializedError>,
	/// Encoded return value; absent on failure.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
}

impl InvocationOutcome {
	/// Successful outcome. An undefined result is encoded as the sentinel.
	pub fn fulfilled(invocation_id: InvocationId, value: Option<Value>) -> Self {
		Self {
			invocation_id,
			error: None,
			value: Some(sentinel::encode_return(value)),
		}
	}

	/// Failed outcome. The value is left undefined.
	pub fn rejected(invocation_id: InvocationId, error: SerializedError) -> Self {
		Self {
			invocation_id,
			error: Some(error),
			value: None,
		}
	}

	/// Receiver-side view of the value, with the undefined sentinel decoded.
	pub fn decoded_value(&self) -> Option<Value> {
		self.value.clone().and_then(sentinel::decode_return)
	}
}

/// Successful setup report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupReply {
	/// Configuration returned by the setup routine, if any.
	pub setup_config: Option<Value>,
	/// Registrations in id order.
	pub registrations: Vec<RegistrationProjection>,
	/// Non-framework modules loaded during setup.
	pub requires: Vec<String>,
}

/// Messages the bridge sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum BridgeMessage {
	/// Setup finished and these registrations are live.
	SetupReply(SetupReply),
	/// Setup, or a single registration during setup, failed.
	SetupError(SerializedError),
	/// Non-fatal problem worth showing the user.
	Warning(SerializedError),
	/// One invocation settled.
	Outcome(InvocationOutcome),
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[test]
	fn execute_command_reads_host_json() {
		let cmd: HostCommand = serde_json::from_value(json!({
			"type": "execute",
			"payload": {
				"event": "task",
				"ids": { "eventId": 3, "invocationId": "inv-1" },
				"args": ["seed", { "rows": 2 }],
			},
		}))
		.unwrap();
		let HostCommand::Execute(cmd) = cmd;
		assert_eq!(cmd.event, "task");
		assert_eq!(cmd.ids, InvocationIds::new(RegistrationId(3), "inv-1"));
		assert_eq!(cmd.args.len(), 2);
	}

	#[test]
	fn missing_invocation_id_is_allowed() {
		let ids: InvocationIds = serde_json::from_value(json!({ "eventId": 0 })).unwrap();
		assert_eq!(ids.invocation_id, None);
	}

	#[test]
	fn rejected_outcome_omits_value() {
		let outcome = InvocationOutcome::rejected("a".into(), SerializedError::new("Error", "boom"));
		assert_eq!(
			serde_json::to_value(&outcome).unwrap(),
			json!({
				"invocationId": "a",
				"error": { "name": "Error", "message": "boom" },
			})
		);
	}

	#[test]
	fn fulfilled_null_stays_null() {
		let outcome = InvocationOutcome::fulfilled("b".into(), Some(Value::Null));
		assert_eq!(outcome.value, Some(Value::Null));
		assert_eq!(outcome.decoded_value(), Some(Value::Null));
	}
}
