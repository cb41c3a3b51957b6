//! Shared harness for bridge integration tests.

#![allow(dead_code)]

use std::time::Duration;

use tether_bridge::PluginBridge;
use tether_config::BridgeOptions;
use tether_proto::{BridgeMessage, ExecuteCommand, InvocationIds, InvocationOutcome, RegistrationId, SerializedError, SetupReply};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// A bridge session plus the host side of its outbound channel.
pub struct TestHost {
	pub bridge: PluginBridge,
	pub rx: mpsc::UnboundedReceiver<BridgeMessage>,
	pub project: tempfile::TempDir,
}

impl TestHost {
	pub fn new() -> Self {
		Self::with(|bridge| bridge)
	}

	/// Builds a host, letting the caller swap collaborators.
	pub fn with(configure: impl FnOnce(PluginBridge) -> PluginBridge) -> Self {
		init_tracing();
		let project = tempfile::tempdir().expect("project dir");
		let (channel, rx) = tether_rpc::outbound_channel();
		let options = BridgeOptions::new(project.path()).with_framework_root(project.path().join("node_modules/runner"));
		let bridge = configure(PluginBridge::new(options, channel));
		Self { bridge, rx, project }
	}

	pub async fn recv_timeout(&mut self) -> Option<BridgeMessage> {
		tokio::time::timeout(Duration::from_secs(5), self.rx.recv()).await.ok().flatten()
	}

	pub fn try_recv(&mut self) -> Option<BridgeMessage> {
		self.rx.try_recv().ok()
	}

	pub async fn outcome(&mut self) -> InvocationOutcome {
		match self.recv_timeout().await {
			Some(BridgeMessage::Outcome(outcome)) => outcome,
			other => panic!("expected an outcome, got {other:?}"),
		}
	}

	pub async fn setup_reply(&mut self) -> SetupReply {
		loop {
			match self.recv_timeout().await {
				Some(BridgeMessage::SetupReply(reply)) => return reply,
				Some(BridgeMessage::SetupError(err)) => panic!("setup failed: {err:?}"),
				Some(_) => continue,
				None => panic!("no setup reply"),
			}
		}
	}

	/// Drains every message currently queued.
	pub fn queued(&mut self) -> Vec<BridgeMessage> {
		std::iter::from_fn(|| self.try_recv()).collect()
	}
}

pub fn setup_errors(messages: &[BridgeMessage]) -> Vec<&SerializedError> {
	messages
		.iter()
		.filter_map(|msg| match msg {
			BridgeMessage::SetupError(err) => Some(err),
			_ => None,
		})
		.collect()
}

pub fn warnings(messages: &[BridgeMessage]) -> Vec<&SerializedError> {
	messages
		.iter()
		.filter_map(|msg| match msg {
			BridgeMessage::Warning(err) => Some(err),
			_ => None,
		})
		.collect()
}

pub fn execute(event: &str, id: RegistrationId, invocation: &str, args: Vec<serde_json::Value>) -> ExecuteCommand {
	ExecuteCommand {
		event: event.to_string(),
		ids: InvocationIds::new(id, invocation),
		args,
	}
}
