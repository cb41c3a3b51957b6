//! One-shot setup: run the user routine, apply defaults, report once.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tether_config::{BridgeOptions, MigrationError, PluginConfig, TestingType};
use tether_proto::{BridgeMessage, EventKind, RegistrationId, SetupReply};
use tether_worker::TaskClass;

use crate::error::BridgeError;
use crate::executor::Channel;
use crate::handler::EventHandler;
use crate::preprocessor::PreprocessorFactory;
use crate::registry::{RegisterOutcome, SharedRegistry};
use crate::requires::RequireLog;
use crate::validate::EventValidator;

/// What the user routine returns: a replacement configuration, or nothing.
pub type SetupResult = anyhow::Result<Option<Value>>;

/// User setup routine.
///
/// Receives the registration callback and the guarded configuration.
#[async_trait]
pub trait SetupRoutine: Send + Sync {
	/// Registers handlers and optionally returns a configuration.
	async fn setup(&self, on: Registrar, config: PluginConfig) -> SetupResult;
}

#[async_trait]
impl<F, Fut> SetupRoutine for F
where
	F: Fn(Registrar, PluginConfig) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = SetupResult> + Send + 'static,
{
	async fn setup(&self, on: Registrar, config: PluginConfig) -> SetupResult {
		self(on, config).await
	}
}

/// Wraps an async closure as a shareable [`SetupRoutine`].
pub fn setup_routine<F, Fut>(f: F) -> Arc<dyn SetupRoutine>
where
	F: Fn(Registrar, PluginConfig) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = SetupResult> + Send + 'static,
{
	Arc::new(f)
}

/// The registration callback handed to the setup routine.
///
/// Rejected registrations are reported to the host right away and return
/// `None`; they never abort setup.
#[derive(Clone)]
pub struct Registrar {
	registry: SharedRegistry,
	channel: Channel,
	validator: Arc<dyn EventValidator>,
	config: Arc<PluginConfig>,
	requires: Arc<Mutex<RequireLog>>,
}

impl std::fmt::Debug for Registrar {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registrar").finish_non_exhaustive()
	}
}

impl Registrar {
	/// Registers `handler` for `event`.
	///
	/// Returns the registration id. A `task` registration that merges into
	/// an existing one returns the existing id.
	pub fn on(&self, event: &str, handler: impl Into<EventHandler>) -> Option<RegistrationId> {
		let handler = handler.into();
		let verdict = self.validator.validate(event, &handler, &self.config);
		if !verdict.is_valid {
			let err = verdict.error.unwrap_or_else(|| BridgeError::InvalidEventName {
				event: event.to_string(),
				user_events: verdict.user_events.unwrap_or_else(EventKind::user_event_names),
			});
			self.reject(event, err);
			return None;
		}

		let Some(kind) = EventKind::parse(event) else {
			self.reject(
				event,
				BridgeError::InvalidEventName {
					event: event.to_string(),
					user_events: EventKind::user_event_names(),
				},
			);
			return None;
		};

		let registered = self.registry.lock().register(kind, handler);
		match registered {
			Ok(RegisterOutcome::Registered(id)) => {
				tracing::debug!(event, id = id.0, "setup.register");
				Some(id)
			}
			Ok(RegisterOutcome::Merged { id, duplicates }) => {
				if !duplicates.is_empty() {
					self.warn(BridgeError::DuplicateTaskKeys { keys: duplicates });
				}
				tracing::debug!(event, id = id.0, "setup.register_merged");
				Some(id)
			}
			Err(err) => {
				self.reject(event, err);
				None
			}
		}
	}

	/// Records a module the routine loaded. Framework modules are ignored.
	pub fn record_require(&self, path: impl AsRef<Path>) {
		self.requires.lock().record(path);
	}

	fn reject(&self, event: &str, err: BridgeError) {
		tracing::warn!(event, error = %err, "setup.register_rejected");
		if self.channel.send(BridgeMessage::SetupError(err.to_serialized())).is_err() {
			tracing::warn!("setup.channel_closed");
		}
	}

	fn warn(&self, warning: BridgeError) {
		tracing::warn!(warning = %warning, "setup.warning");
		if self.channel.send(BridgeMessage::Warning(warning.to_serialized())).is_err() {
			tracing::warn!("setup.channel_closed");
		}
	}
}

/// Runs setup once for a session and reports exactly one reply or error.
#[derive(Clone)]
pub struct SetupOrchestrator {
	options: BridgeOptions,
	registry: SharedRegistry,
	channel: Channel,
	validator: Arc<dyn EventValidator>,
	preprocessors: Arc<dyn PreprocessorFactory>,
}

impl SetupOrchestrator {
	/// Creates an orchestrator over an empty session registry.
	pub fn new(
		options: BridgeOptions,
		registry: SharedRegistry,
		channel: Channel,
		validator: Arc<dyn EventValidator>,
		preprocessors: Arc<dyn PreprocessorFactory>,
	) -> Self {
		Self {
			options,
			registry,
			channel,
			validator,
			preprocessors,
		}
	}

	/// Runs the setup sequence.
	///
	/// # Errors
	///
	/// Domain errors raised anywhere in setup are returned unchanged; any
	/// other failure, panics included, becomes [`BridgeError::SetupFailed`].
	/// The same error has already been sent to the host.
	pub async fn run(&self, config: PluginConfig, routine: Option<Arc<dyn SetupRoutine>>) -> Result<SetupReply, BridgeError> {
		let testing_type = config.testing_type().unwrap_or(self.options.testing_type);
		match self.try_run(config, routine).await {
			Ok(reply) => {
				tracing::info!(
					registrations = reply.registrations.len(),
					requires = reply.requires.len(),
					returned_config = reply.setup_config.is_some(),
					"setup.complete"
				);
				self.send(BridgeMessage::SetupReply(reply.clone()));
				Ok(reply)
			}
			Err(err) => {
				let err = self.classify(err, testing_type);
				tracing::error!(error = %err, code = err.code(), "setup.failed");
				self.send(BridgeMessage::SetupError(err.to_serialized()));
				Err(err)
			}
		}
	}

	async fn try_run(&self, mut config: PluginConfig, routine: Option<Arc<dyn SetupRoutine>>) -> anyhow::Result<SetupReply> {
		self.registry.lock().begin_setup()?;
		config.install_guard();

		let requires = Arc::new(Mutex::new(RequireLog::new(self.options.framework_root.clone())));
		let setup_config = match routine {
			Some(routine) => {
				let on = Registrar {
					registry: Arc::clone(&self.registry),
					channel: self.channel.clone(),
					validator: Arc::clone(&self.validator),
					config: Arc::new(config.clone()),
					requires: Arc::clone(&requires),
				};
				let task = tether_worker::spawn(TaskClass::Setup, async move { routine.setup(on, config).await });
				match task.await {
					Ok(result) => result?,
					Err(err) => {
						let message = tether_worker::join_error_panic_message(err)
							.unwrap_or_else(|| "setup routine was cancelled".to_string());
						return Err(anyhow!("setup routine panicked: {message}"));
					}
				}
			}
			None => {
				tracing::debug!("setup.no_routine");
				None
			}
		};

		let has_preprocessor = self.registry.lock().has_event(EventKind::FilePreprocessor);
		if !has_preprocessor {
			let preprocess = self.preprocessors.create(&self.options.project_root).await?;
			let id = self.registry.lock().register(EventKind::FilePreprocessor, preprocess.into())?.id();
			tracing::debug!(id = id.0, "setup.default_preprocessor");
		}

		if let Some(returned) = &setup_config {
			tether_config::validate(returned)?;
		}

		let registrations = self.registry.lock().projections().to_vec();
		let requires = requires.lock().to_strings();
		Ok(SetupReply {
			setup_config,
			registrations,
			requires,
		})
	}

	fn classify(&self, err: anyhow::Error, testing_type: TestingType) -> BridgeError {
		let err = match err.downcast::<BridgeError>() {
			Ok(domain) => return domain,
			Err(err) => err,
		};
		match err.downcast::<MigrationError>() {
			Ok(migration) => BridgeError::MigratedOption(migration),
			Err(source) => BridgeError::SetupFailed {
				config_file: self.options.config_file_path(),
				testing_type,
				source,
			},
		}
	}

	fn send(&self, msg: BridgeMessage) {
		if self.channel.send(msg).is_err() {
			tracing::warn!("setup.channel_closed");
		}
	}
}

impl std::fmt::Debug for SetupOrchestrator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SetupOrchestrator")
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}
