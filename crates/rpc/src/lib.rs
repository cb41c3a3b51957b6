//! Duplex channel primitives for the plugin bridge boundary.
//!
//! This crate provides transport-agnostic primitives for the bridge process:
//! * `PeerSocket`: Cloneable outbound sink toward the host
//! * `CommandPort` / `CommandStream`: Bounded inbound command queue
//! * `CounterIdGen`: Sequential integer ID allocation

#![warn(missing_docs)]

pub mod error;
pub mod ingress;
pub mod protocol;
pub mod socket;

pub use error::{Error, Result};
pub use ingress::{CommandPort, CommandStream, command_channel};
pub use protocol::CounterIdGen;
pub use socket::{PeerSocket, outbound_channel};
