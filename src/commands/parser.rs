//! Command parser for COBS-decoded frames

use crate::commands::types::{keyer_mode_from_byte, Command, CommandId, ResponseStatus};
use crate::config::morse::{MAX_WPM, MIN_WPM};
use crate::config::protocol::{MAX_TEXT_PAYLOAD, PROTOCOL_VERSION};
use crate::config::tone::{MAX_PITCH_HZ, MIN_PITCH_HZ};
use crc::{Crc, CRC_16_XMODEM};
use heapless::String;

const CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Header (version, id, length) plus trailing CRC
const FRAME_OVERHEAD: usize = 6;

/// Parser for binary protocol commands
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a COBS-decoded frame into a command
    ///
    /// Frame format: [version: u8][cmd_id: u8][length: u16 LE][payload][crc16: u16 LE]
    pub fn parse(&self, data: &[u8]) -> Result<Command, ResponseStatus> {
        if data.len() < FRAME_OVERHEAD {
            return Err(ResponseStatus::InvalidLength);
        }

        let version = data[0];
        let command_id_byte = data[1];
        let length = u16::from_le_bytes([data[2], data[3]]) as usize;

        if version != PROTOCOL_VERSION {
            return Err(ResponseStatus::InvalidVersion);
        }

        if data.len() != FRAME_OVERHEAD + length {
            return Err(ResponseStatus::InvalidLength);
        }

        let (body, crc_bytes) = data.split_at(4 + length);
        let received_crc = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
        if calculate_crc(body) != received_crc {
            return Err(ResponseStatus::CrcError);
        }

        let payload = &body[4..];
        let command_id =
            CommandId::from_byte(command_id_byte).ok_or(ResponseStatus::InvalidCommand)?;

        match command_id {
            CommandId::GetVersion => expect_empty(payload).map(|()| Command::GetVersion),
            CommandId::Stop => expect_empty(payload).map(|()| Command::Stop),
            CommandId::Start => expect_empty(payload).map(|()| Command::Start),
            CommandId::GetStats => expect_empty(payload).map(|()| Command::GetStats),
            CommandId::SetSpeed => {
                let [wpm] = fixed::<1>(payload)?;
                Ok(Command::SetSpeed {
                    wpm: wpm_in_range(wpm)?,
                })
            }
            CommandId::SetSpacing => {
                let [code_wpm, extra_word_spaces] = fixed::<2>(payload)?;
                Ok(Command::SetSpacing {
                    code_wpm: wpm_in_range(code_wpm)?,
                    extra_word_spaces,
                })
            }
            CommandId::SetPitch => {
                let hz = u16::from_le_bytes(fixed::<2>(payload)?);
                if !(MIN_PITCH_HZ..=MAX_PITCH_HZ).contains(&hz) {
                    return Err(ResponseStatus::InvalidValue);
                }
                Ok(Command::SetPitch { hz })
            }
            CommandId::SetKeyerMode => {
                let [mode] = fixed::<1>(payload)?;
                let mode = keyer_mode_from_byte(mode).ok_or(ResponseStatus::InvalidValue)?;
                Ok(Command::SetKeyerMode { mode })
            }
            CommandId::SendText => {
                if payload.is_empty() || payload.len() > MAX_TEXT_PAYLOAD {
                    return Err(ResponseStatus::InvalidLength);
                }
                let text = core::str::from_utf8(payload).map_err(|_| ResponseStatus::InvalidValue)?;
                let mut owned = String::new();
                owned
                    .push_str(text)
                    .map_err(|_| ResponseStatus::InvalidLength)?;
                Ok(Command::SendText { text: owned })
            }
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC-16-XMODEM, shared with the serialiser and with tests building frames
pub fn calculate_crc(data: &[u8]) -> u16 {
    CRC.checksum(data)
}

fn expect_empty(payload: &[u8]) -> Result<(), ResponseStatus> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(ResponseStatus::InvalidLength)
    }
}

fn fixed<const N: usize>(payload: &[u8]) -> Result<[u8; N], ResponseStatus> {
    payload
        .try_into()
        .map_err(|_| ResponseStatus::InvalidLength)
}

fn wpm_in_range(wpm: u8) -> Result<u8, ResponseStatus> {
    if (MIN_WPM..=MAX_WPM).contains(&wpm) {
        Ok(wpm)
    } else {
        Err(ResponseStatus::InvalidValue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morse::KeyerMode;
    use heapless::Vec;

    fn build_frame(cmd_id: u8, payload: &[u8]) -> Vec<u8, 512> {
        let mut frame = Vec::new();
        frame.push(PROTOCOL_VERSION).unwrap();
        frame.push(cmd_id).unwrap();
        frame
            .extend_from_slice(&(payload.len() as u16).to_le_bytes())
            .unwrap();
        frame.extend_from_slice(payload).unwrap();

        let crc = calculate_crc(&frame);
        frame.extend_from_slice(&crc.to_le_bytes()).unwrap();
        frame
    }

    #[test]
    fn test_parse_get_version() {
        let parser = CommandParser::new();
        let frame = build_frame(0x01, &[]);

        let cmd = parser.parse(&frame).expect("Should parse");
        assert_eq!(cmd, Command::GetVersion);
    }

    #[test]
    fn test_parse_set_speed() {
        let parser = CommandParser::new();

        let cmd = parser.parse(&build_frame(0x10, &[25])).unwrap();
        assert_eq!(cmd, Command::SetSpeed { wpm: 25 });

        let result = parser.parse(&build_frame(0x10, &[51]));
        assert_eq!(result, Err(ResponseStatus::InvalidValue));

        let result = parser.parse(&build_frame(0x10, &[20, 0]));
        assert_eq!(result, Err(ResponseStatus::InvalidLength));
    }

    #[test]
    fn test_parse_set_spacing() {
        let parser = CommandParser::new();
        let cmd = parser.parse(&build_frame(0x11, &[5, 2])).unwrap();
        assert_eq!(
            cmd,
            Command::SetSpacing {
                code_wpm: 5,
                extra_word_spaces: 2
            }
        );
    }

    #[test]
    fn test_parse_set_pitch() {
        let parser = CommandParser::new();

        let cmd = parser
            .parse(&build_frame(0x12, &700u16.to_le_bytes()))
            .unwrap();
        assert_eq!(cmd, Command::SetPitch { hz: 700 });

        let result = parser.parse(&build_frame(0x12, &100u16.to_le_bytes()));
        assert_eq!(result, Err(ResponseStatus::InvalidValue));
    }

    #[test]
    fn test_parse_set_keyer_mode() {
        let parser = CommandParser::new();

        let cmd = parser.parse(&build_frame(0x13, &[2])).unwrap();
        assert_eq!(
            cmd,
            Command::SetKeyerMode {
                mode: KeyerMode::Straight
            }
        );

        let result = parser.parse(&build_frame(0x13, &[9]));
        assert_eq!(result, Err(ResponseStatus::InvalidValue));
    }

    #[test]
    fn test_parse_send_text() {
        let parser = CommandParser::new();

        let cmd = parser.parse(&build_frame(0x20, b"CQ DE OP1")).unwrap();
        match cmd {
            Command::SendText { text } => assert_eq!(text.as_str(), "CQ DE OP1"),
            other => panic!("Expected SendText, got {:?}", other),
        }

        let result = parser.parse(&build_frame(0x20, &[]));
        assert_eq!(result, Err(ResponseStatus::InvalidLength));

        let result = parser.parse(&build_frame(0x20, &[0xC3, 0x28]));
        assert_eq!(result, Err(ResponseStatus::InvalidValue));
    }

    #[test]
    fn test_get_version_rejects_payload() {
        let parser = CommandParser::new();
        let result = parser.parse(&build_frame(0x01, &[0x00]));
        assert_eq!(result, Err(ResponseStatus::InvalidLength));
    }

    #[test]
    fn test_invalid_crc() {
        let parser = CommandParser::new();
        let mut frame = build_frame(0x01, &[]);
        let len = frame.len();
        frame[len - 1] ^= 0xFF;

        let result = parser.parse(&frame);
        assert_eq!(result, Err(ResponseStatus::CrcError));
    }

    #[test]
    fn test_invalid_command() {
        let parser = CommandParser::new();
        let frame = build_frame(0xFE, &[]);

        let result = parser.parse(&frame);
        assert_eq!(result, Err(ResponseStatus::InvalidCommand));
    }

    #[test]
    fn test_invalid_version() {
        let parser = CommandParser::new();
        let mut frame: Vec<u8, 512> = Vec::new();
        frame.push(0x00).unwrap(); // wrong version
        frame.push(0x01).unwrap();
        frame.extend_from_slice(&0u16.to_le_bytes()).unwrap();
        let crc = calculate_crc(&frame);
        frame.extend_from_slice(&crc.to_le_bytes()).unwrap();

        let result = parser.parse(&frame);
        assert_eq!(result, Err(ResponseStatus::InvalidVersion));
    }

    #[test]
    fn test_length_mismatch() {
        let parser = CommandParser::new();
        let mut frame = build_frame(0x10, &[20]);
        frame[2] = 4;

        assert_eq!(parser.parse(&frame), Err(ResponseStatus::InvalidLength));
        assert_eq!(
            parser.parse(&[0x01, 0x01, 0x00]),
            Err(ResponseStatus::InvalidLength)
        );
    }
}
