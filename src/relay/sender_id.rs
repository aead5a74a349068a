//! Station identifier carried in every relay frame

use core::fmt;

use heapless::String;

use crate::config::relay::MAX_SENDER_ID_LEN;

/// Letters used for generated identifiers (`A` through `Y`)
const ID_LETTERS: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderIdError {
    Empty,
    TooLong,
    /// Contains a byte outside printable ASCII
    NotPrintable,
}

/// Non-empty printable identifier of at most `MAX_SENDER_ID_LEN` bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderId(String<MAX_SENDER_ID_LEN>);

impl SenderId {
    pub fn new(id: &str) -> Result<Self, SenderIdError> {
        if id.is_empty() {
            return Err(SenderIdError::Empty);
        }
        if !id.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(SenderIdError::NotPrintable);
        }
        let mut text = String::new();
        text.push_str(id).map_err(|_| SenderIdError::TooLong)?;
        Ok(Self(text))
    }

    /// Three-letter identifier derived from device-unique bytes
    /// (for example the tail of the MAC address)
    pub fn from_device_id(device_id: [u8; 3]) -> Self {
        let mut text = String::new();
        for byte in device_id {
            let _ = text.push((b'A' + byte % ID_LETTERS) as char);
        }
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for SenderId {
    type Error = SenderIdError;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
