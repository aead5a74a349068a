//! Serial command reader
//!
//! Accumulates COBS frames from incoming bytes, decodes them and parses
//! commands.

use crate::commands::parser::CommandParser;
use crate::commands::serialiser::cobs_decode;
use crate::commands::types::{Command, ResponseStatus};
use crate::config::protocol::{FRAME_DELIMITER, MAX_FRAME_SIZE};
use crate::protocol::framing::FrameAccumulator;
use heapless::Vec;

/// Outcome of one complete frame
#[derive(Debug, PartialEq)]
pub enum ReadResult {
    /// Successfully parsed a command
    Command(Command),
    /// Parse error; answer with an error response for this command ID
    ParseError(ResponseStatus, u8),
}

/// Serial command reader
pub struct CommandReader {
    accumulator: FrameAccumulator,
    parser: CommandParser,
    /// Frames that were not valid COBS
    discarded: u32,
}

impl CommandReader {
    pub fn new() -> Self {
        Self {
            accumulator: FrameAccumulator::new(),
            parser: CommandParser::new(),
            discarded: 0,
        }
    }

    /// Feed one received byte
    pub fn push(&mut self, byte: u8) -> Option<ReadResult> {
        let frame = self.accumulator.push(byte)?;
        self.process_frame(frame)
    }

    fn process_frame(&mut self, mut frame: Vec<u8, MAX_FRAME_SIZE>) -> Option<ReadResult> {
        // corncobs expects the delimiter the accumulator strips
        let terminated = frame.push(FRAME_DELIMITER).is_ok();

        let decoded = match cobs_decode(&frame) {
            Ok(decoded) if terminated && !decoded.is_empty() => decoded,
            _ => {
                log::debug!("host link: discarding undecodable frame");
                self.discarded = self.discarded.wrapping_add(1);
                return None;
            }
        };

        // Command ID follows the version byte
        let command_id = decoded.get(1).copied().unwrap_or(0);

        match self.parser.parse(&decoded) {
            Ok(cmd) => Some(ReadResult::Command(cmd)),
            Err(status) => {
                log::warn!(
                    "host link: rejected command 0x{:02x}: {:?}",
                    command_id,
                    status
                );
                Some(ReadResult::ParseError(status, command_id))
            }
        }
    }

    /// Frames dropped before parsing (bad COBS or oversized)
    pub fn discarded(&self) -> u32 {
        self.discarded
            .wrapping_add(self.accumulator.overflows())
    }

    /// Discard any partial frame
    pub fn reset(&mut self) {
        self.accumulator.reset();
    }
}

impl Default for CommandReader {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::test_frames::build_test_frame;
    use super::*;

    fn feed(reader: &mut CommandReader, bytes: &[u8]) -> std::vec::Vec<ReadResult> {
        bytes.iter().filter_map(|&b| reader.push(b)).collect()
    }

    #[test]
    fn test_read_get_version() {
        let mut reader = CommandReader::new();
        let results = feed(&mut reader, &build_test_frame(0x01, &[]));
        assert_eq!(results, [ReadResult::Command(Command::GetVersion)]);
    }

    #[test]
    fn test_read_set_speed() {
        let mut reader = CommandReader::new();
        let results = feed(&mut reader, &build_test_frame(0x10, &[18]));
        assert_eq!(results, [ReadResult::Command(Command::SetSpeed { wpm: 18 })]);
    }

    #[test]
    fn test_multiple_frames_split_across_reads() {
        let mut reader = CommandReader::new();
        let frame1 = build_test_frame(0x01, &[]);
        let frame2 = build_test_frame(0x30, &[]);

        let mut stream: std::vec::Vec<u8> = frame1.to_vec();
        stream.extend_from_slice(&frame2);
        let (first, second) = stream.split_at(4);

        let mut results = feed(&mut reader, first);
        results.extend(feed(&mut reader, second));
        assert_eq!(
            results,
            [
                ReadResult::Command(Command::GetVersion),
                ReadResult::Command(Command::GetStats),
            ]
        );
    }

    #[test]
    fn test_parse_error_reports_command_id() {
        let mut reader = CommandReader::new();
        let results = feed(&mut reader, &build_test_frame(0x10, &[99]));
        assert_eq!(
            results,
            [ReadResult::ParseError(ResponseStatus::InvalidValue, 0x10)]
        );
    }

    #[test]
    fn test_garbage_discarded() {
        let mut reader = CommandReader::new();
        // COBS code byte pointing past the end of the frame
        let results = feed(&mut reader, &[0x05, 0x01, 0x00]);
        assert!(results.is_empty());
        assert_eq!(reader.discarded(), 1);

        let results = feed(&mut reader, &build_test_frame(0x01, &[]));
        assert_eq!(results, [ReadResult::Command(Command::GetVersion)]);
    }
}
