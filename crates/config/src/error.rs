//! Error types for configuration handling.

use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error;

use crate::migration::KeyScope;

/// A migrated option was written or found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
	/// The key at `path` is no longer valid where it was set.
	#[error("{}", migrated_message(path, *scope))]
	MigratedOption {
		/// Dotted path of the offending key, e.g. `e2e.integrationFolder`.
		path: String,
		/// Which key set the path belongs to.
		scope: KeyScope,
		/// Where the guard was installed, when the error came from a guarded write.
		installed_at: Option<&'static Location<'static>>,
		/// Where the rejected write happened, or where validation was requested.
		detected_at: &'static Location<'static>,
	},
}

impl MigrationError {
	/// Dotted path of the offending key.
	pub fn path(&self) -> &str {
		match self {
			Self::MigratedOption { path, .. } => path,
		}
	}

	/// Human-readable capture sites, innermost first.
	pub fn trace(&self) -> String {
		match self {
			Self::MigratedOption {
				installed_at,
				detected_at,
				..
			} => {
				let mut trace = format!("    at {detected_at}");
				if let Some(installed_at) = installed_at {
					trace.push_str(&format!("\n    guard installed at {installed_at}"));
				}
				trace
			}
		}
	}
}

fn migrated_message(path: &str, scope: KeyScope) -> String {
	match scope {
		KeyScope::Global => {
			format!("the `{path}` configuration option was removed and can no longer be set")
		}
		KeyScope::PerTestingType => format!(
			"the `{path}` configuration option is now invalid at the root of the config; set it inside the `e2e` or `component` object instead"
		),
	}
}

/// Errors raised while loading bridge options.
#[derive(Debug, Error)]
pub enum OptionsError {
	/// Error reading an options file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or shape.
	#[error("failed to parse bridge options: {0}")]
	Parse(#[from] toml::de::Error),

	/// A testing type other than `e2e` or `component`.
	#[error("invalid testing type: {0} (expected 'e2e' or 'component')")]
	InvalidTestingType(String),
}

/// Result type for option loading.
pub type Result<T> = std::result::Result<T, OptionsError>;
