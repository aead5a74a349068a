//! Frame accumulator for the COBS-encoded host link
//!
//! Accumulates bytes until a complete frame (delimited by 0x00) is received.

use crate::config::protocol::{FRAME_DELIMITER, MAX_FRAME_SIZE};
use heapless::Vec;

/// Accumulates incoming bytes and extracts complete COBS frames.
///
/// A frame that outgrows the buffer is dropped whole: everything up to the
/// next delimiter is discarded, so the tail of an oversized frame is never
/// mistaken for the start of a new one.
pub struct FrameAccumulator {
    buffer: Vec<u8, MAX_FRAME_SIZE>,
    discarding: bool,
    overflows: u32,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            discarding: false,
            overflows: 0,
        }
    }

    /// Push a byte into the accumulator.
    ///
    /// Returns `Some(frame)` when a delimiter completes a non-empty frame.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8, MAX_FRAME_SIZE>> {
        if byte == FRAME_DELIMITER {
            if core::mem::take(&mut self.discarding) || self.buffer.is_empty() {
                return None;
            }
            return Some(core::mem::take(&mut self.buffer));
        }

        if self.discarding {
            return None;
        }

        if self.buffer.push(byte).is_err() {
            log::warn!("host link: frame exceeds {} bytes, dropped", MAX_FRAME_SIZE);
            self.buffer.clear();
            self.discarding = true;
            self.overflows = self.overflows.wrapping_add(1);
        }

        None
    }

    /// Discard any partial frame
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// No partial frame in progress
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Frames dropped for exceeding the buffer
    pub fn overflows(&self) -> u32 {
        self.overflows
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
