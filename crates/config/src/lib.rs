//! Configuration for the plugin bridge.
//!
//! Two kinds of configuration live here:
//!
//! - **Plugin configuration** ([`PluginConfig`]): the JSON object handed to the
//!   user setup routine. It is guarded against migrated options: once
//!   [`PluginConfig::install_guard`] has run, writing any key that moved or
//!   disappeared in the current schema fails immediately.
//! - **Bridge options** ([`BridgeOptions`]): how the bridge process itself is
//!   set up (project root, config file, testing type), loaded from TOML.
//!
//! # Migrated Options
//!
//! Keys fall into two sets:
//!
//! ```text
//! anywhere:  integrationFolder componentFolder pluginsFile testFiles ignoreTestFiles
//! root-only: baseUrl supportFile specPattern excludeSpecPattern indexHtmlFile
//! ```
//!
//! Anywhere keys are rejected at the root and under every testing type
//! (`e2e.integrationFolder`). Root-only keys are rejected at the root but are
//! still valid inside `e2e { }` or `component { }`.
//!
//! [`validate`] runs the same rules read-only over a plain JSON value, for
//! configurations returned wholesale by the setup routine.

pub mod error;
pub mod migration;
pub mod options;
pub mod plugin;

pub use error::{MigrationError, OptionsError, Result};
pub use migration::{ConfigMigrationKey, KeyScope, MigrationGuard, TestingType, migration_keys, validate};
pub use options::BridgeOptions;
pub use plugin::PluginConfig;
