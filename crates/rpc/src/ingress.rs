//! Inbound command queue.
//!
//! Commands from the host are staged in a bounded channel so a flood of
//! execute requests cannot grow memory without limit.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::{Error, Result};

/// Default inbound queue capacity.
pub const DEFAULT_COMMAND_CAPACITY: usize = 1024;

/// Cloneable command enqueue port held by the host side.
pub struct CommandPort<C>
where
	C: Send + 'static,
{
	tx: mpsc::Sender<C>,
	drops: Arc<AtomicU64>,
}

impl<C> Clone for CommandPort<C>
where
	C: Send + 'static,
{
	fn clone(&self) -> Self {
		Self {
			tx: self.tx.clone(),
			drops: Arc::clone(&self.drops),
		}
	}
}

impl<C> CommandPort<C>
where
	C: Send + 'static,
{
	/// Non-blocking enqueue.
	///
	/// # Errors
	///
	/// Returns [`Error::QueueFull`] or [`Error::ChannelClosed`].
	pub fn try_send(&self, cmd: C) -> Result<()> {
		match self.tx.try_send(cmd) {
			Ok(()) => Ok(()),
			Err(mpsc::error::TrySendError::Full(_)) => {
				let count = self.drops.fetch_add(1, Ordering::Relaxed);
				if count % 1024 == 0 {
					tracing::warn!(drops = count + 1, "bridge command queue full, dropping command");
				}
				Err(Error::QueueFull)
			}
			Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::ChannelClosed),
		}
	}

	/// Async enqueue. Waits for capacity if full.
	///
	/// # Errors
	///
	/// Returns [`Error::ChannelClosed`] when the bridge stopped reading.
	pub async fn send(&self, cmd: C) -> Result<()> {
		self.tx.send(cmd).await.map_err(|_| Error::ChannelClosed)
	}

	/// Number of commands rejected because the queue was full.
	pub fn dropped(&self) -> u64 {
		self.drops.load(Ordering::Relaxed)
	}
}

/// Receiving end of the command queue, owned by the bridge.
#[derive(Debug)]
pub struct CommandStream<C> {
	rx: mpsc::Receiver<C>,
}

impl<C> CommandStream<C>
where
	C: Send + 'static,
{
	/// Waits for the next command. Returns `None` once every port is dropped.
	pub async fn recv(&mut self) -> Option<C> {
		self.rx.recv().await
	}
}

/// Creates a bounded command queue. A capacity of zero falls back to
/// [`DEFAULT_COMMAND_CAPACITY`].
pub fn command_channel<C>(capacity: usize) -> (CommandPort<C>, CommandStream<C>)
where
	C: Send + 'static,
{
	let capacity = if capacity == 0 { DEFAULT_COMMAND_CAPACITY } else { capacity };
	let (tx, rx) = mpsc::channel(capacity);
	(
		CommandPort {
			tx,
			drops: Arc::new(AtomicU64::new(0)),
		},
		CommandStream { rx },
	)
}
