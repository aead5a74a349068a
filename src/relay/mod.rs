//! Character relay between stations sharing a channel

pub mod framer;
pub mod queue;
pub mod sender_id;
pub mod transport;

pub use framer::{frame, parse, try_parse, FrameError, FrameText};
pub use queue::{CircularQueue, Direction, RelayQueue, RelayQueues};
pub use sender_id::{SenderId, SenderIdError};
pub use transport::{RelayTransport, TransportError};
