//! Serial port trait for the host link
//!
//! Non-blocking so the link can be serviced from the same polling loop as
//! the session; the platform's UART or USB CDC driver sits behind it.

/// Errors that can occur during serial operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// Framing error in received data
    FramingError,
    /// Buffer overflow
    OverflowError,
    /// Write error
    WriteError,
}

/// Abstract serial port interface
pub trait SerialPort {
    /// Copy whatever bytes are available into `buf`.
    ///
    /// Returns `Ok(0)` when nothing is waiting. Must not block.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError>;

    /// Queue bytes for transmission
    fn write(&mut self, data: &[u8]) -> Result<(), SerialError>;
}
