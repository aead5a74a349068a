//! Response serialiser with COBS encoding

use crate::commands::parser::calculate_crc;
use crate::commands::types::Response;
use crate::config::protocol::{MAX_FRAME_SIZE, PROTOCOL_VERSION};
use crate::session::{Origin, RelayStats};
use heapless::Vec;

/// Response IDs
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum ResponseId {
    Version = 0x01,
    Ack = 0x02,
    Speed = 0x10,
    Pitch = 0x12,
    TextQueued = 0x20,
    Stats = 0x30,
    Decoded = 0x40,
    Error = 0xFF,
}

/// Bytes in a serialised [`RelayStats`]
pub const STATS_PAYLOAD_LEN: usize = 10 * 4;

/// Serialiser for response frames
pub struct ResponseSerialiser;

impl ResponseSerialiser {
    pub fn new() -> Self {
        Self
    }

    /// Serialise a response to a COBS-encoded frame, trailing delimiter
    /// included
    pub fn serialise(&self, response: &Response) -> Vec<u8, MAX_FRAME_SIZE> {
        let raw = self.build_raw_frame(response);
        cobs_encode(&raw)
    }

    /// Frame format: [version: u8][resp_id: u8][length: u16 LE][payload][crc16: u16 LE]
    fn build_raw_frame(&self, response: &Response) -> Vec<u8, MAX_FRAME_SIZE> {
        let mut payload: Vec<u8, STATS_PAYLOAD_LEN> = Vec::new();

        let id = match response {
            Response::Version {
                major,
                minor,
                patch,
            } => {
                let _ = payload.extend_from_slice(&[*major, *minor, *patch]);
                ResponseId::Version
            }
            Response::Ack => ResponseId::Ack,
            Response::Speed { wpm } => {
                let _ = payload.push(*wpm);
                ResponseId::Speed
            }
            Response::Pitch { hz } => {
                let _ = payload.extend_from_slice(&hz.to_le_bytes());
                ResponseId::Pitch
            }
            Response::TextQueued { accepted } => {
                let _ = payload.push(*accepted);
                ResponseId::TextQueued
            }
            Response::Stats(stats) => {
                for counter in stats_fields(stats) {
                    let _ = payload.extend_from_slice(&counter.to_le_bytes());
                }
                ResponseId::Stats
            }
            Response::Decoded { origin, ch } => {
                let origin = match origin {
                    Origin::Local => 0,
                    Origin::Remote => 1,
                };
                let _ = payload.extend_from_slice(&[origin, *ch]);
                ResponseId::Decoded
            }
            Response::Error {
                status,
                original_command_id,
            } => {
                let _ = payload.extend_from_slice(&[*status as u8, *original_command_id]);
                ResponseId::Error
            }
        };

        let mut frame: Vec<u8, MAX_FRAME_SIZE> = Vec::new();
        let _ = frame.push(PROTOCOL_VERSION);
        let _ = frame.push(id as u8);
        let _ = frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        let _ = frame.extend_from_slice(&payload);

        let crc = calculate_crc(&frame);
        let _ = frame.extend_from_slice(&crc.to_le_bytes());
        frame
    }
}

impl Default for ResponseSerialiser {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters in wire order
fn stats_fields(stats: &RelayStats) -> [u32; 10] {
    [
        stats.sent,
        stats.received,
        stats.loop_back,
        stats.malformed,
        stats.publish_failures,
        stats.receive_errors,
        stats.outbound_overruns,
        stats.inbound_overruns,
        stats.decode_misses,
        stats.decode_overflows,
    ]
}

/// COBS encode with corncobs; the output ends with the zero delimiter
pub fn cobs_encode(data: &[u8]) -> Vec<u8, MAX_FRAME_SIZE> {
    let mut output: Vec<u8, MAX_FRAME_SIZE> = Vec::new();
    output.resize(corncobs::max_encoded_len(data.len()), 0).ok();
    let len = corncobs::encode_buf(data, &mut output);
    output.truncate(len);
    output
}

/// COBS decode with corncobs; `encoded` may include the trailing delimiter
#[allow(clippy::result_unit_err)]
pub fn cobs_decode(encoded: &[u8]) -> Result<Vec<u8, MAX_FRAME_SIZE>, ()> {
    let mut output: Vec<u8, MAX_FRAME_SIZE> = Vec::new();
    output.resize(encoded.len(), 0).map_err(|_| ())?;
    let len = corncobs::decode_buf(encoded, &mut output).map_err(|_| ())?;
    output.truncate(len);
    Ok(output)
}
