//! Plugin execution bridge.
//!
//! A session runs a user setup routine once, letting it register lifecycle
//! event handlers, then serves execute commands that name those handlers by
//! id. Every invocation reports its own outcome, correlated by the caller's
//! invocation id, so completions may arrive in any order.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use tether_bridge::{EventHandler, PluginBridge, setup_routine};
//! use tether_config::{BridgeOptions, PluginConfig};
//!
//! let (channel, _outbound) = tether_rpc::outbound_channel();
//! let bridge = PluginBridge::new(BridgeOptions::new("/work/app"), channel);
//! let routine = setup_routine(|on, config: PluginConfig| async move {
//! 	on.on("before:run", EventHandler::callable(|_| async { Ok(None) }));
//! 	Ok(Some(config.into_value()))
//! });
//! bridge.setup(PluginConfig::default(), Some(routine)).await?;
//!
//! let (_port, commands) = bridge.command_channel();
//! bridge.serve(commands).await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod bridge;
mod dispatch;
mod error;
mod executor;
mod handler;
mod preprocessor;
mod registry;
mod requires;
mod setup;
mod task;
mod validate;

pub use bridge::PluginBridge;
pub use dispatch::Dispatcher;
pub use error::{BridgeError, Result, serialize_error};
pub use executor::{BrowserLaunchExecutor, Channel, EventExecutor, Executors, Invoke, WrapExecutor, wrap};
pub use handler::{
	EventHandler, HandlerFn, HandlerFuture, HandlerResult, TaskEntry, TaskFn, TaskMap, handler, noop_handler,
};
pub use preprocessor::{
	BundlerPreprocessor, DefaultPreprocessorFactory, PreprocessorFactory, TYPESCRIPT_ENTRY, resolve_typescript,
};
pub use registry::{EventRegistry, RegisterOutcome, Registration, SharedRegistry};
pub use requires::RequireLog;
pub use setup::{Registrar, SetupOrchestrator, SetupResult, SetupRoutine, setup_routine};
pub use task::{task_execute, task_get_body, task_get_keys};
pub use validate::{EventValidator, LifecycleEventValidator, Validation};
