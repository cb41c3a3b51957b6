//! Marker values standing in for "undefined" on the wire.
//!
//! JSON has no undefined, so the bridge and host agree on fixed strings.
//! Handlers see `Option<Value>`: `None` is undefined, `Some(Value::Null)`
//! is a real null.

use serde_json::Value;

/// Sent as the value of an outcome whose handler returned undefined.
pub const UNDEFINED: &str = "__tether_undefined__";

/// Sent as the task argument when the caller supplied none.
pub const TASK_NO_ARGUMENT: &str = "__tether_task_no_argument__";

/// Resolved value of a task invocation naming no bound handler.
pub const UNHANDLED_TASK: &str = "__tether_unhandled__";

/// Encodes a handler result for the wire.
pub fn encode_return(value: Option<Value>) -> Value {
	value.unwrap_or_else(|| Value::String(UNDEFINED.to_string()))
}

/// Decodes a wire value produced by [`encode_return`].
pub fn decode_return(value: Value) -> Option<Value> {
	if is_marker(&value, UNDEFINED) { None } else { Some(value) }
}

/// Encodes an optional task argument for the wire.
pub fn encode_task_arg(arg: Option<Value>) -> Value {
	arg.unwrap_or_else(|| Value::String(TASK_NO_ARGUMENT.to_string()))
}

/// Decodes a task argument. Both the sentinel and a missing argument become `None`.
pub fn decode_task_arg(arg: Option<Value>) -> Option<Value> {
	arg.filter(|value| !is_marker(value, TASK_NO_ARGUMENT))
}

/// The value a task invocation resolves to when no handler is bound.
pub fn unhandled_task() -> Value {
	Value::String(UNHANDLED_TASK.to_string())
}

/// True when `value` is the unhandled-task marker.
pub fn is_unhandled_task(value: &Value) -> bool {
	is_marker(value, UNHANDLED_TASK)
}

fn is_marker(value: &Value, marker: &str) -> bool {
	value.as_str() == Some(marker)
}
