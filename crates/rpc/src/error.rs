//! Error types for channel operations.

use thiserror::Error;

/// Errors raised by the bridge channel primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
	/// The peer dropped its end of the channel.
	#[error("channel closed")]
	ChannelClosed,
	/// The bounded command queue has no free capacity.
	#[error("command queue full")]
	QueueFull,
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;
