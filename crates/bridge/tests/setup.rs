//! Setup orchestration: registration, defaults, and failure reporting.

mod common;

use anyhow::anyhow;
use common::{TestHost, execute, setup_errors, warnings};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tether_bridge::{BridgeError, EventHandler, Registrar, SetupResult, TaskEntry, TaskFn, handler, noop_handler, setup_routine};
use tether_config::{PluginConfig, TestingType};
use tether_proto::{BridgeMessage, RegistrationId, RegistrationProjection};

fn projection(event: &str, id: u64) -> RegistrationProjection {
	RegistrationProjection {
		event: event.to_string(),
		id: RegistrationId(id),
	}
}

fn task(value: i64) -> TaskEntry {
	TaskFn::new(move |_| async move { Ok(Some(json!(value))) }).into()
}

fn config(value: Value) -> PluginConfig {
	PluginConfig::from_value(value).expect("config object")
}

async fn exploding_setup(_on: Registrar, _config: PluginConfig) -> SetupResult {
	panic!("plugin exploded")
}

#[tokio::test]
async fn setup_without_routine_registers_internal_events_and_default_preprocessor() {
	let mut host = TestHost::new();
	let reply = host.bridge.setup(PluginConfig::default(), None).await.unwrap();

	assert_eq!(
		reply.registrations,
		vec![
			projection("_get:task:body", 0),
			projection("_get:task:keys", 1),
			projection("file:preprocessor", 2),
		]
	);
	assert_eq!(reply.setup_config, None);
	assert_eq!(host.setup_reply().await, reply);
}

#[tokio::test]
async fn ids_follow_call_order_and_task_merge_consumes_none() {
	let mut host = TestHost::new();
	let routine = setup_routine(|on, _config| async move {
		let ids = [
			on.on("before:run", noop_handler()),
			on.on("task", EventHandler::tasks([("a", task(1))])),
			on.on("task", EventHandler::tasks([("b", task(2))])),
			on.on("after:spec", noop_handler()),
		];
		Ok(Some(json!({ "ids": ids })))
	});
	let reply = host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap();

	assert_eq!(reply.setup_config, Some(json!({ "ids": [2, 3, 3, 4] })));
	assert_eq!(
		reply.registrations,
		vec![
			projection("_get:task:body", 0),
			projection("_get:task:keys", 1),
			projection("before:run", 2),
			projection("task", 3),
			projection("after:spec", 4),
			projection("file:preprocessor", 5),
		]
	);
	assert!(warnings(&host.queued()).is_empty());
	assert_eq!(host.bridge.registry().lock().task_keys(), ["a", "b"]);
}

#[tokio::test]
async fn overlapping_task_key_warns_once_and_later_handler_wins() {
	let mut host = TestHost::new();
	let routine = setup_routine(|on, _config| async move {
		on.on("task", EventHandler::tasks([("a", task(1)), ("b", task(2))]));
		on.on("task", EventHandler::tasks([("b", task(3)), ("c", task(4))]));
		Ok(None)
	});
	host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap();

	let messages = host.queued();
	let warnings = warnings(&messages);
	assert_eq!(warnings.len(), 1);
	assert_eq!(warnings[0].code.as_deref(), Some("DUPLICATE_TASK_KEY"));
	assert_eq!(warnings[0].details, Some(json!({ "keys": ["b"] })));

	host.bridge.execute(execute("task", RegistrationId(2), "inv", vec![json!("b")]));
	assert_eq!(host.outcome().await.value, Some(json!(3)));
}

#[tokio::test]
async fn invalid_registrations_are_reported_without_aborting_setup() {
	let mut host = TestHost::new();
	let routine = setup_routine(|on, _config| async move {
		let ids = [
			on.on("before:everything", noop_handler()),
			on.on("_get:task:keys", noop_handler()),
			on.on("task", noop_handler()),
			on.on("after:run", EventHandler::tasks([("a", task(1))])),
			on.on("after:run", noop_handler()),
		];
		Ok(Some(json!({ "ids": ids })))
	});
	let reply = host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap();
	assert_eq!(reply.setup_config, Some(json!({ "ids": [null, null, null, null, 2] })));

	let messages = host.queued();
	let codes: Vec<_> = setup_errors(&messages).iter().filter_map(|err| err.code.clone()).collect();
	assert_eq!(
		codes,
		[
			"INVALID_EVENT_NAME",
			"INVALID_EVENT_NAME",
			"INVALID_EVENT_HANDLER",
			"INVALID_EVENT_HANDLER"
		]
	);
	let user_events = setup_errors(&messages)[0]
		.details
		.as_ref()
		.and_then(|details| details.get("userEvents"))
		.cloned();
	assert_eq!(
		user_events,
		Some(json!([
			"after:run",
			"after:screenshot",
			"after:spec",
			"before:browser:launch",
			"before:run",
			"before:spec",
			"dev-server:start",
			"file:preprocessor",
			"task"
		]))
	);
	assert!(matches!(messages.last(), Some(BridgeMessage::SetupReply(_))));
}

#[tokio::test]
async fn second_dev_server_is_rejected_and_first_stays_bound() {
	let mut host = TestHost::new();
	let routine = setup_routine(|on, _config| async move {
		let first = on.on("dev-server:start", handler(|_| async { Ok(Some(json!("first"))) }));
		let second = on.on("dev-server:start", handler(|_| async { Ok(Some(json!("second"))) }));
		Ok(Some(json!({ "ids": [first, second] })))
	});
	let reply = host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap();
	assert_eq!(reply.setup_config, Some(json!({ "ids": [2, null] })));

	let messages = host.queued();
	let errors = setup_errors(&messages);
	assert_eq!(errors.len(), 1);
	assert_eq!(errors[0].name, "DevServerAlreadyRegisteredError");

	host.bridge.execute(execute("dev-server:start", RegistrationId(2), "inv", vec![json!({})]));
	assert_eq!(host.outcome().await.value, Some(json!("first")));
}

#[tokio::test]
async fn user_preprocessor_suppresses_the_default() {
	let mut host = TestHost::new();
	let routine = setup_routine(|on, _config| async move {
		on.on("file:preprocessor", handler(|_| async { Ok(Some(json!("bundled"))) }));
		Ok(None)
	});
	let reply = host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap();
	let preprocessors: Vec<_> = reply.registrations.iter().filter(|p| p.event == "file:preprocessor").collect();
	assert_eq!(preprocessors, [&projection("file:preprocessor", 2)]);

	host.bridge.execute(execute("file:preprocessor", RegistrationId(2), "inv", vec![json!({ "filePath": "/a.ts" })]));
	assert_eq!(host.outcome().await.value, Some(json!("bundled")));
}

#[tokio::test]
async fn default_preprocessor_answers_with_the_output_path() {
	let mut host = TestHost::new();
	host.bridge.setup(PluginConfig::default(), None).await.unwrap();

	let file = json!({ "filePath": "/app/spec.ts", "outputPath": "/tmp/spec.js" });
	host.bridge.execute(execute("file:preprocessor", RegistrationId(2), "inv", vec![file]));
	assert_eq!(host.outcome().await.value, Some(json!("/tmp/spec.js")));
}

#[tokio::test]
async fn requires_are_ordered_deduplicated_and_skip_the_framework() {
	let mut host = TestHost::new();
	let root = host.project.path().to_path_buf();
	let routine = setup_routine(move |on, _config| {
		let root = root.clone();
		async move {
			on.record_require(root.join("plugins/db.js"));
			on.record_require(root.join("node_modules/runner/index.js"));
			on.record_require(root.join("plugins/mail.js"));
			on.record_require(root.join("plugins/db.js"));
			Ok(None)
		}
	});
	let reply = host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap();

	let root = host.project.path();
	assert_eq!(
		reply.requires,
		[
			root.join("plugins/db.js").display().to_string(),
			root.join("plugins/mail.js").display().to_string()
		]
	);
}

#[tokio::test]
async fn writing_a_root_only_key_fails_setup_naming_the_key() {
	let mut host = TestHost::new();
	let routine = setup_routine(|_on, mut config: PluginConfig| async move {
		config.set_path("e2e.baseUrl", json!("http://localhost:3000"))?;
		config.set("baseUrl", json!("http://localhost:3000"))?;
		Ok(Some(config.into_value()))
	});
	let err = host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap_err();

	let BridgeError::MigratedOption(migration) = &err else {
		panic!("expected a migrated option error, got {err:?}");
	};
	assert_eq!(migration.path(), "baseUrl");
	assert!(migration.trace().contains("guard installed at"));

	let messages = host.queued();
	assert_eq!(messages.len(), 1);
	let BridgeMessage::SetupError(wire) = &messages[0] else {
		panic!("expected a setup error, got {:?}", messages[0]);
	};
	assert_eq!(wire.code.as_deref(), Some("MIGRATED_OPTION"));
	assert!(wire.message.contains("baseUrl"));
}

#[tokio::test]
async fn writing_a_removed_key_under_a_testing_type_fails_setup() {
	let mut host = TestHost::new();
	let routine = setup_routine(|_on, mut config: PluginConfig| async move {
		config.set_path("e2e.integrationFolder", json!("cypress/integration"))?;
		Ok(None)
	});
	let err = host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap_err();
	let BridgeError::MigratedOption(migration) = err else {
		panic!("expected a migrated option error");
	};
	assert_eq!(migration.path(), "e2e.integrationFolder");
}

#[tokio::test]
async fn returned_config_is_validated_after_setup() {
	let cases = [
		(json!({ "baseUrl": "http://localhost" }), Some("baseUrl")),
		(json!({ "component": { "testFiles": "**/*.cy.ts" } }), Some("component.testFiles")),
		(json!({ "baseUrl": "", "e2e": { "baseUrl": "http://localhost" } }), None),
	];
	for (returned, expected) in cases {
		let mut host = TestHost::new();
		let routine = setup_routine(move |_on, _config| {
			let returned = returned.clone();
			async move { Ok(Some(returned)) }
		});
		let result = host.bridge.setup(PluginConfig::default(), Some(routine)).await;
		match (result, expected) {
			(Err(BridgeError::MigratedOption(migration)), Some(path)) => assert_eq!(migration.path(), path),
			(Ok(reply), None) => assert!(reply.setup_config.is_some()),
			(other, expected) => panic!("expected {expected:?}, got {other:?}"),
		}
		assert_eq!(host.queued().len(), 1);
	}
}

#[tokio::test]
async fn plain_errors_are_wrapped_with_config_file_and_testing_type() {
	let mut host = TestHost::new();
	let routine = setup_routine(|_on, _config| async move { Err(anyhow!("cannot read fixtures")) });
	let initial = config(json!({ "testingType": "component" }));
	let err = host.bridge.setup(initial, Some(routine)).await.unwrap_err();

	let BridgeError::SetupFailed {
		config_file,
		testing_type,
		source,
	} = &err
	else {
		panic!("expected a wrapped setup failure, got {err:?}");
	};
	assert_eq!(config_file, &host.project.path().join("cypress.config.js"));
	assert_eq!(*testing_type, TestingType::Component);
	assert_eq!(source.to_string(), "cannot read fixtures");

	let messages = host.queued();
	let errors = setup_errors(&messages);
	assert_eq!(errors.len(), 1);
	assert_eq!(errors[0].code.as_deref(), Some("SETUP_ROUTINE_FAILED"));
	assert_eq!(errors[0].details.as_ref().and_then(|d| d.get("testingType")), Some(&json!("component")));
	assert!(!messages.iter().any(|msg| matches!(msg, BridgeMessage::SetupReply(_))));
}

#[tokio::test]
async fn domain_errors_from_the_routine_pass_through() {
	let mut host = TestHost::new();
	let routine = setup_routine(|_on, _config| async move { Err(BridgeError::DevServerAlreadyRegistered.into()) });
	let err = host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap_err();
	assert!(matches!(err, BridgeError::DevServerAlreadyRegistered));
	assert_eq!(setup_errors(&host.queued())[0].code.as_deref(), Some("DEV_SERVER_ALREADY_REGISTERED"));
}

#[tokio::test]
async fn panicking_routine_is_reported_as_setup_failure() {
	let mut host = TestHost::new();
	let err = host
		.bridge
		.setup(PluginConfig::default(), Some(setup_routine(exploding_setup)))
		.await
		.unwrap_err();

	let BridgeError::SetupFailed { source, .. } = &err else {
		panic!("expected a wrapped setup failure, got {err:?}");
	};
	assert!(source.to_string().contains("plugin exploded"));
	assert_eq!(setup_errors(&host.queued()).len(), 1);
}

#[tokio::test]
async fn second_setup_is_rejected_and_leaves_registrations_alone() {
	let mut host = TestHost::new();
	let first = host.bridge.setup(PluginConfig::default(), None).await.unwrap();
	host.queued();

	let routine = setup_routine(|on, _config| async move {
		on.on("before:run", noop_handler());
		Ok(None)
	});
	let err = host.bridge.setup(PluginConfig::default(), Some(routine)).await.unwrap_err();

	assert!(matches!(err, BridgeError::SetupAlreadyRan));
	assert_eq!(setup_errors(&host.queued())[0].code.as_deref(), Some("SETUP_ALREADY_RAN"));
	assert_eq!(host.bridge.registry().lock().projections().to_vec(), first.registrations);
}
