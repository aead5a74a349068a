//! Publish/subscribe transport abstraction
//!
//! The session only needs a connection flag, a way to publish a frame to the
//! shared channel and a non-blocking receive. A broker client, a radio link or
//! a mock all fit behind this trait.

/// Errors reported by a relay transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No broker connection
    NotConnected,
    /// Publish rejected or failed to send
    PublishFailed,
    /// Incoming message does not fit the receive buffer
    MessageTooLarge,
    /// Reception failed
    ReceiveFailed,
}

/// Non-blocking relay transport
pub trait RelayTransport {
    /// Whether the transport is currently connected to the shared channel
    fn is_connected(&self) -> bool;

    /// Publish one frame on `channel`
    fn publish(&mut self, channel: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Copy the next pending message into `buf`
    ///
    /// Returns `Ok(None)` when nothing is waiting. Must not block.
    fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError>;
}
