//! The configuration object handed to the user setup routine.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::MigrationError;
use crate::migration::{MigrationGuard, TestingType};

/// Plugin configuration: a JSON object with an optional migrated-option guard.
///
/// Reads are unrestricted. Writes go through [`Self::set`] or
/// [`Self::set_path`], which consult the guard once it is installed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginConfig {
	values: Map<String, Value>,
	guard: Option<GuardSite>,
}

/// Equality ignores where a guard came from; only whether one is armed.
#[derive(Debug, Clone, Copy)]
struct GuardSite(MigrationGuard);

impl PartialEq for GuardSite {
	fn eq(&self, _other: &Self) -> bool {
		true
	}
}

impl PluginConfig {
	/// Wraps a JSON object. The guard is not armed yet.
	pub fn new(values: Map<String, Value>) -> Self {
		Self { values, guard: None }
	}

	/// Wraps a JSON value, or returns `None` when it is not an object.
	pub fn from_value(value: Value) -> Option<Self> {
		match value {
			Value::Object(values) => Some(Self::new(values)),
			_ => None,
		}
	}

	/// Arms the migrated-option guard, capturing the caller as installation site.
	#[track_caller]
	pub fn install_guard(&mut self) {
		self.guard = Some(GuardSite(MigrationGuard::install()));
	}

	/// True once [`Self::install_guard`] has run.
	pub fn is_guarded(&self) -> bool {
		self.guard.is_some()
	}

	/// Reads a root key.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	/// Reads a dotted path such as `e2e.baseUrl`.
	pub fn get_path(&self, path: &str) -> Option<&Value> {
		let mut segments = path.split('.');
		let first = segments.next()?;
		segments.try_fold(self.values.get(first)?, |value, segment| value.get(segment))
	}

	/// Writes a root key.
	///
	/// # Errors
	///
	/// Fails with [`MigrationError`] when the guard is armed and `key` is migrated.
	#[track_caller]
	pub fn set(&mut self, key: &str, value: Value) -> Result<(), MigrationError> {
		self.set_path(key, value)
	}

	/// Writes a dotted path, creating intermediate objects as needed.
	///
	/// A non-object value in the middle of the path is replaced by an object.
	///
	/// # Errors
	///
	/// Fails with [`MigrationError`] when the guard is armed and the path is migrated.
	#[track_caller]
	pub fn set_path(&mut self, path: &str, value: Value) -> Result<(), MigrationError> {
		let segments: Vec<&str> = path.split('.').collect();
		if let Some(GuardSite(guard)) = &self.guard {
			guard.check_write(&segments, &value)?;
		}

		let Some((last, parents)) = segments.split_last() else {
			return Ok(());
		};
		let mut target = &mut self.values;
		for segment in parents {
			let slot = target
				.entry(segment.to_string())
				.or_insert_with(|| Value::Object(Map::new()));
			if !slot.is_object() {
				*slot = Value::Object(Map::new());
			}
			let Some(next) = slot.as_object_mut() else {
				return Ok(());
			};
			target = next;
		}
		target.insert(last.to_string(), value);
		Ok(())
	}

	/// Project root recorded by the host, if any.
	pub fn project_root(&self) -> Option<PathBuf> {
		self.get("projectRoot").and_then(Value::as_str).map(PathBuf::from)
	}

	/// Testing type recorded by the host, if it names a known one.
	pub fn testing_type(&self) -> Option<TestingType> {
		self.get("testingType").and_then(Value::as_str)?.parse().ok()
	}

	/// Borrowed view of the underlying object.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.values
	}

	/// Plain JSON copy of the configuration.
	pub fn to_value(&self) -> Value {
		Value::Object(self.values.clone())
	}

	/// Consumes the configuration into plain JSON.
	pub fn into_value(self) -> Value {
		Value::Object(self.values)
	}
}
