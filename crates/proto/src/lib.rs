//! Wire types shared between the plugin bridge and its host.
//!
//! Nothing in here can carry a live closure: handlers are referenced by
//! [`types::RegistrationId`] and every value is plain JSON.

#![warn(missing_docs)]

pub mod events;
pub mod sentinel;
pub mod types;

pub use events::EventKind;
pub use types::{
	BridgeMessage, ExecuteCommand, HostCommand, InvocationId, InvocationIds, InvocationOutcome, RegistrationId,
	RegistrationProjection, SerializedError, SetupReply,
};
