//! Outbound half of the bridge channel.

use tokio::sync::mpsc;

use crate::{Error, Result};

/// Cloneable sink for messages flowing from the bridge to its host.
///
/// Every clone feeds the same unbounded queue, so concurrent invocations can
/// report independently without coordinating with each other.
#[derive(Debug)]
pub struct PeerSocket<M> {
	tx: mpsc::UnboundedSender<M>,
}

impl<M> Clone for PeerSocket<M> {
	fn clone(&self) -> Self {
		Self { tx: self.tx.clone() }
	}
}

impl<M> PeerSocket<M>
where
	M: Send + 'static,
{
	/// Wraps an existing sender.
	pub fn from_sender(tx: mpsc::UnboundedSender<M>) -> Self {
		Self { tx }
	}

	/// Queues one message for the host.
	///
	/// # Errors
	///
	/// Returns [`Error::ChannelClosed`] when the host side has been dropped.
	pub fn send(&self, msg: M) -> Result<()> {
		self.tx.send(msg).map_err(|_| Error::ChannelClosed)
	}

	/// Returns true once the receiving side is gone.
	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

/// Creates an outbound socket and the receiver the host drains.
pub fn outbound_channel<M>() -> (PeerSocket<M>, mpsc::UnboundedReceiver<M>)
where
	M: Send + 'static,
{
	let (tx, rx) = mpsc::unbounded_channel();
	(PeerSocket::from_sender(tx), rx)
}
