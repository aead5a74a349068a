//! Command and response types for the host control link
//!
//! # Protocol Format
//!
//! All frames use COBS encoding with a zero byte delimiter:
//! ```text
//! [COBS-encoded payload][0x00]
//! ```
//!
//! The payload format (before COBS encoding):
//! ```text
//! [version: u8][cmd_id: u8][length: u16 LE][payload: [u8; length]][crc16: u16 LE]
//! ```
//!
//! - `version`: Protocol version (currently 1)
//! - `cmd_id`: Command or response identifier
//! - `length`: Payload length in bytes (little-endian)
//! - `crc16`: CRC-16-XMODEM over all preceding bytes

use crate::config::protocol::MAX_TEXT_PAYLOAD;
use crate::morse::KeyerMode;
use crate::session::{Origin, RelayStats};
use heapless::String;

/// Command IDs
///
/// Commands are sent from the host to the device.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    /// Firmware version (0x01)
    ///
    /// - Payload: None
    /// - Response: [`Response::Version`]
    GetVersion = 0x01,

    /// Stop practice, silence and clear everything (0x02)
    ///
    /// - Payload: None
    /// - Response: [`Response::Ack`]
    Stop = 0x02,

    /// Resume practice (0x03)
    ///
    /// - Payload: None
    /// - Response: [`Response::Ack`]
    Start = 0x03,

    /// Character speed (0x10)
    ///
    /// - Payload: `[wpm: u8]`
    /// - Response: [`Response::Speed`]
    SetSpeed = 0x10,

    /// Farnsworth speed and extra word spacing (0x11)
    ///
    /// - Payload: `[code_wpm: u8][extra_word_spaces: u8]`
    /// - Response: [`Response::Ack`]
    SetSpacing = 0x11,

    /// Sidetone pitch (0x12)
    ///
    /// - Payload: `[hz: u16 LE]`
    /// - Response: [`Response::Pitch`]
    SetPitch = 0x12,

    /// Keyer discipline (0x13)
    ///
    /// - Payload: `[mode: u8]` (0 = Iambic A, 1 = Iambic B, 2 = straight)
    /// - Response: [`Response::Ack`]
    SetKeyerMode = 0x13,

    /// Relay text as if keyed (0x20)
    ///
    /// - Payload: UTF-8 text (1-128 bytes)
    /// - Response: [`Response::TextQueued`]
    SendText = 0x20,

    /// Relay counters (0x30)
    ///
    /// - Payload: None
    /// - Response: [`Response::Stats`]
    GetStats = 0x30,
}

impl CommandId {
    /// Try to convert a byte to a CommandId
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::GetVersion),
            0x02 => Some(Self::Stop),
            0x03 => Some(Self::Start),
            0x10 => Some(Self::SetSpeed),
            0x11 => Some(Self::SetSpacing),
            0x12 => Some(Self::SetPitch),
            0x13 => Some(Self::SetKeyerMode),
            0x20 => Some(Self::SendText),
            0x30 => Some(Self::GetStats),
            _ => None,
        }
    }
}

/// Keyer mode as carried on the wire
pub fn keyer_mode_from_byte(byte: u8) -> Option<KeyerMode> {
    match byte {
        0 => Some(KeyerMode::IambicA),
        1 => Some(KeyerMode::IambicB),
        2 => Some(KeyerMode::Straight),
        _ => None,
    }
}

/// Parsed command with associated data
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetVersion,
    Stop,
    Start,
    SetSpeed { wpm: u8 },
    SetSpacing { code_wpm: u8, extra_word_spaces: u8 },
    SetPitch { hz: u16 },
    SetKeyerMode { mode: KeyerMode },
    SendText { text: String<MAX_TEXT_PAYLOAD> },
    GetStats,
}

impl Command {
    /// Get the command ID for this command
    pub fn id(&self) -> CommandId {
        match self {
            Command::GetVersion => CommandId::GetVersion,
            Command::Stop => CommandId::Stop,
            Command::Start => CommandId::Start,
            Command::SetSpeed { .. } => CommandId::SetSpeed,
            Command::SetSpacing { .. } => CommandId::SetSpacing,
            Command::SetPitch { .. } => CommandId::SetPitch,
            Command::SetKeyerMode { .. } => CommandId::SetKeyerMode,
            Command::SendText { .. } => CommandId::SendText,
            Command::GetStats => CommandId::GetStats,
        }
    }
}

/// Response status codes
///
/// Used in [`Response::Error`] to indicate why a command failed.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Command executed successfully (0x00)
    Success = 0x00,

    /// Unknown or invalid command ID (0x01)
    InvalidCommand = 0x01,

    /// Payload length invalid for the command (0x02)
    InvalidLength = 0x02,

    /// CRC-16 checksum mismatch (0x03)
    CrcError = 0x03,

    /// Protocol version not supported (0x04)
    InvalidVersion = 0x04,

    /// Payload value out of range or not decodable (0x05)
    ///
    /// Examples: speed outside 3-50 WPM, unknown keyer mode, text that is
    /// not UTF-8
    InvalidValue = 0x05,

    /// Session is stopped (0x10)
    NotRunning = 0x10,
}

/// Response to a command
///
/// Responses are sent from the device to the host. They use the same frame
/// format as commands but with response IDs instead of command IDs.
///
/// # Response IDs
///
/// | ID   | Response   | Description                  |
/// |------|------------|------------------------------|
/// | 0x01 | Version    | Firmware version             |
/// | 0x02 | Ack        | Command applied              |
/// | 0x10 | Speed      | Speed in effect              |
/// | 0x12 | Pitch      | Pitch in effect              |
/// | 0x20 | TextQueued | Characters accepted          |
/// | 0x30 | Stats      | Relay counters               |
/// | 0x40 | Decoded    | Character shown (unsolicited)|
/// | 0xFF | Error      | Error with status code       |
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Payload: `[major: u8][minor: u8][patch: u8]`
    Version { major: u8, minor: u8, patch: u8 },

    /// Payload: None
    Ack,

    /// Payload: `[wpm: u8]`
    Speed { wpm: u8 },

    /// Payload: `[hz: u16 LE]`
    Pitch { hz: u16 },

    /// Payload: `[accepted: u8]`
    TextQueued { accepted: u8 },

    /// Payload: ten `u32 LE` counters in [`RelayStats`] field order
    Stats(RelayStats),

    /// Character echoed on the display (unsolicited)
    ///
    /// Payload: `[origin: u8][ch: u8]`, origin 0 = local, 1 = remote
    Decoded { origin: Origin, ch: u8 },

    /// Payload: `[status: u8][original_command_id: u8]`
    Error {
        status: ResponseStatus,
        original_command_id: u8,
    },
}

impl Response {
    /// Create an error response for a given command
    pub fn error(status: ResponseStatus, command_id: CommandId) -> Self {
        Self::Error {
            status,
            original_command_id: command_id as u8,
        }
    }

    /// Create an error response with raw command ID (for unknown commands)
    pub fn error_raw(status: ResponseStatus, original_command_id: u8) -> Self {
        Self::Error {
            status,
            original_command_id,
        }
    }

    /// Unsolicited notice for a displayed character; `None` for non-ASCII
    pub fn decoded(ch: char, origin: Origin) -> Option<Self> {
        u8::try_from(ch)
            .ok()
            .filter(u8::is_ascii)
            .map(|ch| Self::Decoded { origin, ch })
    }
}
