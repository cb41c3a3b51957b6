//! Per-session store of registered handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tether_proto::{EventKind, RegistrationId, RegistrationProjection};
use tether_rpc::CounterIdGen;

use crate::error::BridgeError;
use crate::handler::{EventHandler, HandlerFn, TaskEntry, TaskMap, noop_handler};

/// Registry shared between the setup callback and the dispatcher.
///
/// The lock is only taken for synchronous lookups and inserts, never across
/// an await.
pub type SharedRegistry = Arc<Mutex<EventRegistry>>;

/// One registered handler.
#[derive(Debug, Clone)]
pub struct Registration {
	/// Stable id, allocated at registration time.
	pub id: RegistrationId,
	/// Event the handler is bound to.
	pub event: EventKind,
	/// The handler itself.
	pub handler: EventHandler,
}

/// What a successful registration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
	/// A new registration took the id.
	Registered(RegistrationId),
	/// Tasks were merged into the existing `task` registration.
	Merged {
		/// Id of the existing task registration.
		id: RegistrationId,
		/// Task names that were already bound and got replaced.
		duplicates: Vec<String>,
	},
}

impl RegisterOutcome {
	/// Id the registration lives under.
	pub fn id(&self) -> RegistrationId {
		match self {
			Self::Registered(id) | Self::Merged { id, .. } => *id,
		}
	}
}

/// Handlers registered during one session.
///
/// Ids start at 0 and are never reused. Registrations are never removed;
/// the task registration is only ever extended in place.
#[derive(Debug, Default)]
pub struct EventRegistry {
	id_gen: CounterIdGen,
	by_id: BTreeMap<RegistrationId, Registration>,
	projections: Vec<RegistrationProjection>,
	task_id: Option<RegistrationId>,
	dev_server_id: Option<RegistrationId>,
	setup_started: bool,
}

impl EventRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty registry behind a shared lock.
	pub fn shared() -> SharedRegistry {
		Arc::new(Mutex::new(Self::new()))
	}

	/// Marks the session as set up and reserves the internal task
	/// introspection events with no-op handlers.
	///
	/// Their behavior lives in the dispatcher; the placeholders only claim
	/// the ids.
	///
	/// # Errors
	///
	/// Returns [`BridgeError::SetupAlreadyRan`] on every call after the
	/// first; the registry is left untouched.
	pub fn begin_setup(&mut self) -> Result<(), BridgeError> {
		if self.setup_started {
			return Err(BridgeError::SetupAlreadyRan);
		}
		self.setup_started = true;
		for kind in [EventKind::GetTaskBody, EventKind::GetTaskKeys] {
			self.insert(kind, EventHandler::Callable(noop_handler()));
		}
		Ok(())
	}

	/// Registers a handler for an already validated event.
	///
	/// # Errors
	///
	/// Returns [`BridgeError::DevServerAlreadyRegistered`] on a second
	/// `dev-server:start`; the first binding stays in place.
	pub fn register(&mut self, event: EventKind, handler: EventHandler) -> Result<RegisterOutcome, BridgeError> {
		match event {
			EventKind::DevServerStart if self.dev_server_id.is_some() => Err(BridgeError::DevServerAlreadyRegistered),
			EventKind::Task => Ok(self.register_tasks(handler)),
			_ => Ok(RegisterOutcome::Registered(self.insert(event, handler))),
		}
	}

	fn register_tasks(&mut self, handler: EventHandler) -> RegisterOutcome {
		let existing = self.task_id.and_then(|id| self.by_id.get_mut(&id).map(|reg| (id, reg)));
		let (id, registration) = match existing {
			Some(found) => found,
			None => return RegisterOutcome::Registered(self.insert(EventKind::Task, handler)),
		};

		let incoming = match handler {
			EventHandler::Tasks(tasks) => tasks,
			EventHandler::Callable(_) => TaskMap::new(),
		};
		let EventHandler::Tasks(current) = &mut registration.handler else {
			registration.handler = EventHandler::Tasks(incoming);
			return RegisterOutcome::Merged { id, duplicates: Vec::new() };
		};

		let mut duplicates = Vec::new();
		for (name, entry) in incoming {
			if current.insert(name.clone(), entry).is_some() {
				duplicates.push(name);
			}
		}
		RegisterOutcome::Merged { id, duplicates }
	}

	fn insert(&mut self, event: EventKind, handler: EventHandler) -> RegistrationId {
		let id = RegistrationId(self.id_gen.next());
		match event {
			EventKind::Task => self.task_id = Some(id),
			EventKind::DevServerStart => self.dev_server_id = Some(id),
			_ => {}
		}
		self.by_id.insert(id, Registration { id, event, handler });
		self.projections.push(RegistrationProjection {
			event: event.as_str().to_string(),
			id,
		});
		tracing::debug!(event = event.as_str(), id = id.0, "registry.insert");
		id
	}

	/// Looks up one registration.
	pub fn get(&self, id: RegistrationId) -> Option<&Registration> {
		self.by_id.get(&id)
	}

	/// Clones the callable bound under `id`. Task maps have no single callable.
	pub fn callable(&self, id: RegistrationId) -> Option<HandlerFn> {
		match &self.get(id)?.handler {
			EventHandler::Callable(f) => Some(Arc::clone(f)),
			EventHandler::Tasks(_) => None,
		}
	}

	/// True when at least one registration exists for `event`.
	pub fn has_event(&self, event: EventKind) -> bool {
		self.by_id.values().any(|reg| reg.event == event)
	}

	fn tasks(&self) -> Option<&TaskMap> {
		match &self.get(self.task_id?)?.handler {
			EventHandler::Tasks(tasks) => Some(tasks),
			EventHandler::Callable(_) => None,
		}
	}

	/// Clones the task entry bound to `name`.
	pub fn task_entry(&self, name: &str) -> Option<TaskEntry> {
		self.tasks()?.get(name).cloned()
	}

	/// Task names in registration order.
	pub fn task_keys(&self) -> Vec<String> {
		self.tasks().map(|tasks| tasks.keys().cloned().collect()).unwrap_or_default()
	}

	/// Source text of a task, or an empty string when it is not callable.
	pub fn task_body(&self, name: &str) -> String {
		match self.task_entry(name) {
			Some(TaskEntry::Callable(task)) => match task.body() {
				Some(body) => body.to_string(),
				None => format!("[native task {name}]"),
			},
			Some(TaskEntry::Value(_)) | None => String::new(),
		}
	}

	/// Registrations in id order, as reported to the host.
	pub fn projections(&self) -> &[RegistrationProjection] {
		&self.projections
	}

	/// Number of live registrations.
	pub fn len(&self) -> usize {
		self.by_id.len()
	}

	/// True when nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.by_id.is_empty()
	}
}
