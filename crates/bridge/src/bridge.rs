//! One bridge session: setup once, then serve execute commands.

use std::sync::Arc;

use parking_lot::Mutex;
use tether_config::{BridgeOptions, PluginConfig};
use tether_proto::{ExecuteCommand, HostCommand, SetupReply};
use tether_rpc::{CommandPort, CommandStream, command_channel};
use tether_worker::{TaskClass, WorkerJoinSet};

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::executor::{Channel, Executors};
use crate::preprocessor::{DefaultPreprocessorFactory, PreprocessorFactory};
use crate::registry::{EventRegistry, SharedRegistry};
use crate::setup::{SetupOrchestrator, SetupRoutine};
use crate::validate::{EventValidator, LifecycleEventValidator};

/// A plugin bridge session.
///
/// Owns the registry for the session, so nothing is shared process-wide.
/// Execute commands each run as their own task and may settle in any
/// order; the in-flight set is only locked to spawn or swap, never while
/// waiting.
pub struct PluginBridge {
	options: BridgeOptions,
	registry: SharedRegistry,
	channel: Channel,
	validator: Arc<dyn EventValidator>,
	executors: Executors,
	preprocessors: Arc<dyn PreprocessorFactory>,
	in_flight: Mutex<WorkerJoinSet<()>>,
}

impl std::fmt::Debug for PluginBridge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PluginBridge")
			.field("options", &self.options)
			.field("in_flight", &self.in_flight.lock().len())
			.finish_non_exhaustive()
	}
}

impl PluginBridge {
	/// Creates a session with the default collaborators.
	pub fn new(options: BridgeOptions, channel: Channel) -> Self {
		Self {
			options,
			registry: EventRegistry::shared(),
			channel,
			validator: Arc::new(LifecycleEventValidator),
			executors: Executors::default(),
			preprocessors: Arc::new(DefaultPreprocessorFactory),
			in_flight: Mutex::new(WorkerJoinSet::new(TaskClass::Invocation)),
		}
	}

	/// Replaces the event validator.
	#[must_use]
	pub fn with_validator(mut self, validator: impl EventValidator + 'static) -> Self {
		self.validator = Arc::new(validator);
		self
	}

	/// Replaces the per-event executors.
	#[must_use]
	pub fn with_executors(mut self, executors: Executors) -> Self {
		self.executors = executors;
		self
	}

	/// Replaces the factory for the default preprocessor.
	#[must_use]
	pub fn with_preprocessor_factory(mut self, factory: impl PreprocessorFactory + 'static) -> Self {
		self.preprocessors = Arc::new(factory);
		self
	}

	/// Session options.
	pub fn options(&self) -> &BridgeOptions {
		&self.options
	}

	/// Registry for this session.
	pub fn registry(&self) -> &SharedRegistry {
		&self.registry
	}

	/// Creates the inbound command queue sized from the options.
	pub fn command_channel(&self) -> (CommandPort<HostCommand>, CommandStream<HostCommand>) {
		command_channel(self.options.command_capacity)
	}

	/// Orchestrator for this session's setup.
	pub fn orchestrator(&self) -> SetupOrchestrator {
		SetupOrchestrator::new(
			self.options.clone(),
			Arc::clone(&self.registry),
			self.channel.clone(),
			Arc::clone(&self.validator),
			Arc::clone(&self.preprocessors),
		)
	}

	/// Dispatcher over this session's registry.
	pub fn dispatcher(&self) -> Dispatcher {
		Dispatcher::new(Arc::clone(&self.registry), self.channel.clone(), self.executors.clone())
	}

	/// Runs setup. See [`SetupOrchestrator::run`].
	///
	/// # Errors
	///
	/// Returns the setup error that was reported to the host.
	pub async fn setup(&self, config: PluginConfig, routine: Option<Arc<dyn SetupRoutine>>) -> Result<SetupReply> {
		self.orchestrator().run(config, routine).await
	}

	/// Starts one execute command without waiting for it.
	pub fn execute(&self, cmd: ExecuteCommand) {
		let dispatcher = self.dispatcher();
		self.in_flight.lock().spawn(async move { dispatcher.execute(cmd).await });
	}

	/// Starts one host command without waiting for it.
	pub fn handle(&self, cmd: HostCommand) {
		match cmd {
			HostCommand::Execute(cmd) => self.execute(cmd),
		}
	}

	/// Number of commands still running.
	pub fn in_flight(&self) -> usize {
		self.in_flight.lock().len()
	}

	/// Handles commands until every port is dropped, then waits for the
	/// commands still running. Returns how many commands were handled.
	pub async fn serve(&self, mut commands: CommandStream<HostCommand>) -> usize {
		let mut handled = 0;
		while let Some(cmd) = commands.recv().await {
			self.handle(cmd);
			handled += 1;
			self.reap();
		}
		let drained = self.drain().await;
		tracing::info!(handled, drained, "bridge.serve_finished");
		handled
	}

	/// Waits for every command started so far.
	pub async fn drain(&self) -> usize {
		let mut pending = std::mem::replace(&mut *self.in_flight.lock(), WorkerJoinSet::new(TaskClass::Invocation));
		pending.drain().await
	}

	fn reap(&self) {
		let mut in_flight = self.in_flight.lock();
		while let Some(result) = in_flight.try_join_next() {
			if let Err(err) = result
				&& let Some(msg) = tether_worker::join_error_panic_message(err)
			{
				tracing::error!(panic = %msg, "bridge.dispatch_panicked");
			}
		}
	}
}
