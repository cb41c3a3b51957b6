//! Settings for the bridge process itself.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OptionsError, Result};
use crate::migration::TestingType;

/// Environment variable overriding [`BridgeOptions::testing_type`].
pub const TESTING_TYPE_ENV: &str = "TETHER_TESTING_TYPE";

/// How one bridge session is set up.
///
/// ```toml
/// project_root = "/work/app"
/// config_file = "cypress.config.ts"
/// testing_type = "component"
/// framework_root = "/opt/runner"
/// command_capacity = 256
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeOptions {
	/// Root of the user's project. Used to resolve the type checker.
	pub project_root: PathBuf,
	/// User configuration file, reported in setup errors.
	#[serde(default = "default_config_file")]
	pub config_file: PathBuf,
	/// Testing type the session runs under.
	#[serde(default)]
	pub testing_type: TestingType,
	/// Install location of the test framework; modules below it are not
	/// reported as user requires.
	#[serde(default)]
	pub framework_root: Option<PathBuf>,
	/// Inbound command queue capacity. Zero picks the channel default.
	#[serde(default)]
	pub command_capacity: usize,
}

fn default_config_file() -> PathBuf {
	PathBuf::from("cypress.config.js")
}

impl BridgeOptions {
	/// Options for `project_root` with every other field defaulted.
	pub fn new(project_root: impl Into<PathBuf>) -> Self {
		Self {
			project_root: project_root.into(),
			config_file: default_config_file(),
			testing_type: TestingType::default(),
			framework_root: None,
			command_capacity: 0,
		}
	}

	/// Sets the testing type.
	#[must_use]
	pub fn with_testing_type(mut self, testing_type: TestingType) -> Self {
		self.testing_type = testing_type;
		self
	}

	/// Sets the config file.
	#[must_use]
	pub fn with_config_file(mut self, config_file: impl Into<PathBuf>) -> Self {
		self.config_file = config_file.into();
		self
	}

	/// Sets the framework root.
	#[must_use]
	pub fn with_framework_root(mut self, framework_root: impl Into<PathBuf>) -> Self {
		self.framework_root = Some(framework_root.into());
		self
	}

	/// Parses options from a TOML string.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		Ok(toml::from_str(input)?)
	}

	/// Loads options from a TOML file, then applies environment overrides.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| OptionsError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		let options = Self::from_toml_str(&content)?;
		options.with_env_overrides(std::env::var(TESTING_TYPE_ENV).ok().as_deref())
	}

	/// Applies an explicit testing-type override, as read from [`TESTING_TYPE_ENV`].
	pub fn with_env_overrides(mut self, testing_type: Option<&str>) -> Result<Self> {
		if let Some(raw) = testing_type {
			self.testing_type = raw.parse()?;
			tracing::debug!(testing_type = %self.testing_type, "bridge options overridden from environment");
		}
		Ok(self)
	}

	/// Absolute path of the config file.
	pub fn config_file_path(&self) -> PathBuf {
		if self.config_file.is_absolute() {
			self.config_file.clone()
		} else {
			self.project_root.join(&self.config_file)
		}
	}
}
