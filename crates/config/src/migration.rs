//! Guards for configuration keys that moved or were removed.

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MigrationError, OptionsError};

/// Keys rejected at the root and under every testing type.
pub const ANYWHERE_KEYS: &[&str] = &["integrationFolder", "componentFolder", "pluginsFile", "testFiles", "ignoreTestFiles"];

/// Keys rejected at the root but still valid under a testing type.
pub const ROOT_KEYS: &[&str] = &["baseUrl", "supportFile", "specPattern", "excludeSpecPattern", "indexHtmlFile"];

/// Testing type the session runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestingType {
	/// End-to-end testing.
	#[default]
	E2e,
	/// Component testing.
	Component,
}

impl TestingType {
	/// Every testing type, in config-key order.
	pub const ALL: [TestingType; 2] = [Self::E2e, Self::Component];

	/// The config key of this testing type's scope object.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::E2e => "e2e",
			Self::Component => "component",
		}
	}

	fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|tt| tt.as_str() == key)
	}
}

impl fmt::Display for TestingType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TestingType {
	type Err = OptionsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_key(s).ok_or_else(|| OptionsError::InvalidTestingType(s.to_string()))
	}
}

/// Which key set a migrated path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
	/// Removed everywhere.
	Global,
	/// Removed from the root, still valid per testing type.
	PerTestingType,
}

/// One guarded configuration path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMigrationKey {
	/// Dotted path, e.g. `baseUrl` or `component.testFiles`.
	pub path: String,
	/// Key set the path comes from.
	pub scope: KeyScope,
}

/// Every path the guard rejects, root keys first.
pub fn migration_keys() -> Vec<ConfigMigrationKey> {
	let root = ANYWHERE_KEYS
		.iter()
		.map(|key| (key.to_string(), KeyScope::Global))
		.chain(ROOT_KEYS.iter().map(|key| (key.to_string(), KeyScope::PerTestingType)));
	let nested = TestingType::ALL.into_iter().flat_map(|tt| {
		ANYWHERE_KEYS
			.iter()
			.map(move |key| (format!("{tt}.{key}"), KeyScope::Global))
	});
	root.chain(nested)
		.map(|(path, scope)| ConfigMigrationKey { path, scope })
		.collect()
}

fn root_scope(key: &str) -> Option<KeyScope> {
	if ANYWHERE_KEYS.contains(&key) {
		Some(KeyScope::Global)
	} else if ROOT_KEYS.contains(&key) {
		Some(KeyScope::PerTestingType)
	} else {
		None
	}
}

/// Armed write guard for one configuration object.
///
/// The guard records where it was installed so a rejected write can point
/// back at both the write and the installation.
#[derive(Debug, Clone, Copy)]
pub struct MigrationGuard {
	installed_at: &'static Location<'static>,
}

impl MigrationGuard {
	/// Arms a guard, capturing the caller as the installation site.
	#[track_caller]
	pub fn install() -> Self {
		let installed_at = Location::caller();
		tracing::debug!(%installed_at, keys = migration_keys().len(), "config.migration_guard.install");
		Self { installed_at }
	}

	/// Where the guard was installed.
	pub fn installed_at(&self) -> &'static Location<'static> {
		self.installed_at
	}

	/// Checks a write of `value` at `path` (split on `.`).
	///
	/// Any write to a guarded path fails, whatever the value. Replacing a
	/// whole testing-type object fails when the replacement carries a key
	/// from the anywhere set.
	///
	/// # Errors
	///
	/// Returns [`MigrationError::MigratedOption`] naming the offending path.
	#[track_caller]
	pub fn check_write(&self, path: &[&str], value: &Value) -> Result<(), MigrationError> {
		let detected_at = Location::caller();
		let reject = |path: String, scope: KeyScope| MigrationError::MigratedOption {
			path,
			scope,
			installed_at: Some(self.installed_at),
			detected_at,
		};

		match path {
			[] => Ok(()),
			[key] => {
				if let Some(scope) = root_scope(key) {
					return Err(reject(key.to_string(), scope));
				}
				if let Some(tt) = TestingType::from_key(key)
					&& let Some(obj) = value.as_object()
					&& let Some(nested) = ANYWHERE_KEYS.iter().find(|k| obj.contains_key(**k))
				{
					return Err(reject(format!("{tt}.{nested}"), KeyScope::Global));
				}
				Ok(())
			}
			[key, nested, ..] => {
				if let Some(scope) = root_scope(key) {
					return Err(reject(key.to_string(), scope));
				}
				if let Some(tt) = TestingType::from_key(key)
					&& ANYWHERE_KEYS.contains(nested)
				{
					return Err(reject(format!("{tt}.{nested}"), KeyScope::Global));
				}
				Ok(())
			}
		}
	}
}

/// Scans `config` read-only for migrated options with a truthy value.
///
/// Root keys of both sets are checked first, then the anywhere set under
/// each testing type. Non-object configurations pass.
///
/// # Errors
///
/// Returns the first [`MigrationError::MigratedOption`] found.
#[track_caller]
pub fn validate(config: &Value) -> Result<(), MigrationError> {
	let detected_at = Location::caller();
	let Some(root) = config.as_object() else {
		return Ok(());
	};

	for key in ANYWHERE_KEYS.iter().chain(ROOT_KEYS) {
		if root.get(*key).is_some_and(is_truthy)
			&& let Some(scope) = root_scope(key)
		{
			return Err(MigrationError::MigratedOption {
				path: key.to_string(),
				scope,
				installed_at: None,
				detected_at,
			});
		}
	}

	for tt in TestingType::ALL {
		let Some(scoped) = root.get(tt.as_str()).and_then(Value::as_object) else {
			continue;
		};
		if let Some(key) = ANYWHERE_KEYS.iter().find(|key| scoped.get(**key).is_some_and(is_truthy)) {
			return Err(MigrationError::MigratedOption {
				path: format!("{tt}.{key}"),
				scope: KeyScope::Global,
				installed_at: None,
				detected_at,
			});
		}
	}

	Ok(())
}

/// JSON truthiness: everything except null, false, zero and the empty string.
pub fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
