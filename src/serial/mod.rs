pub mod link;
pub mod reader;
pub mod traits;

pub use link::HostLink;
pub use reader::{CommandReader, ReadResult};
pub use traits::{SerialError, SerialPort};
