//! Mark/space decoder
//!
//! Classifies each completed segment against the current [`TimeUnit`] and
//! accumulates dits and dahs until a character gap flushes them through the
//! code table. Only ratios to the unit are used, so the same keying decodes
//! identically at any speed in range.

use crate::config::morse::{
    CHAR_GAP_THRESHOLD_UNITS, DAH_THRESHOLD_UNITS, DEFAULT_WPM, WORD_GAP_THRESHOLD_UNITS,
};
use crate::morse::table::{self, Element, MorsePattern};
use crate::morse::timing::TimeUnit;

/// Output of the decoder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// A character ended by a character gap
    Char(char),
    /// A character ended by a word gap
    CharThenSpace(char),
    /// A word gap after a character that was already emitted
    Space,
}

impl Decoded {
    /// Printable characters, with the word space as `' '`
    pub fn chars(self) -> impl Iterator<Item = char> {
        let (first, second) = match self {
            Decoded::Char(ch) => (ch, None),
            Decoded::CharThenSpace(ch) => (ch, Some(' ')),
            Decoded::Space => (' ', None),
        };
        core::iter::once(first).chain(second)
    }
}

/// How much of the current space has already been acted on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SpaceState {
    Open,
    CharFlushed,
    WordFlushed,
}

/// Timing decoder
pub struct Decoder {
    unit: TimeUnit,
    /// Speed change waiting for the next character boundary
    next_unit: Option<TimeUnit>,
    pattern: MorsePattern,
    /// Pattern overflowed; drop marks until the next flush
    overflowed: bool,
    space: SpaceState,
    /// A character was emitted since the last word space
    word_open: bool,

    misses: u32,
    overflows: u32,
}

impl Decoder {
    pub fn new(wpm: u8) -> Self {
        Self {
            unit: TimeUnit::from_wpm(wpm),
            next_unit: None,
            pattern: MorsePattern::new(),
            overflowed: false,
            space: SpaceState::Open,
            word_open: false,
            misses: 0,
            overflows: 0,
        }
    }

    /// Change the reference speed from the next character on.
    ///
    /// Segments of the character in progress, and a mark still being
    /// keyed, are classified at the speed they were sent with. Use
    /// [`commit_speed`](Self::commit_speed) when the key is known to be
    /// between characters.
    pub fn set_wpm(&mut self, wpm: u8) {
        self.next_unit = Some(TimeUnit::from_wpm(wpm));
    }

    /// Apply a pending speed change now
    pub fn commit_speed(&mut self) {
        if let Some(unit) = self.next_unit.take() {
            self.unit = unit;
        }
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Feed one completed mark or space
    pub fn observe(&mut self, duration_ms: u32, is_mark: bool) -> Option<Decoded> {
        if is_mark {
            self.mark(duration_ms);
            None
        } else {
            self.space(duration_ms)
        }
    }

    /// Feed the length of a space that is still running.
    ///
    /// Emits as soon as a threshold is crossed. The same space reported
    /// later through [`observe`](Self::observe) does not emit again.
    pub fn idle(&mut self, silence_ms: u32) -> Option<Decoded> {
        self.space(silence_ms)
    }

    /// Elements accumulated for the character in progress
    pub fn pending(&self) -> MorsePattern {
        self.pattern
    }

    /// Patterns that matched no character
    pub fn misses(&self) -> u32 {
        self.misses
    }

    /// Patterns discarded for exceeding the maximum length
    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    /// Discard the character in progress
    pub fn reset(&mut self) {
        self.commit_speed();
        self.pattern.clear();
        self.overflowed = false;
        self.space = SpaceState::Open;
        self.word_open = false;
    }

    fn mark(&mut self, duration_ms: u32) {
        self.space = SpaceState::Open;
        if self.overflowed {
            return;
        }

        let element = if duration_ms < self.unit.times(DAH_THRESHOLD_UNITS) {
            Element::Dit
        } else {
            Element::Dah
        };

        if self.pattern.push(element).is_err() {
            log::debug!("decoder: pattern {} overflowed, discarding", self.pattern);
            self.pattern.clear();
            self.overflowed = true;
            self.overflows = self.overflows.wrapping_add(1);
        }
    }

    fn space(&mut self, duration_ms: u32) -> Option<Decoded> {
        if duration_ms < self.unit.times(CHAR_GAP_THRESHOLD_UNITS) {
            return None;
        }

        if duration_ms < self.unit.times(WORD_GAP_THRESHOLD_UNITS) {
            if self.space != SpaceState::Open {
                return None;
            }
            self.space = SpaceState::CharFlushed;
            return self.flush().map(Decoded::Char);
        }

        let ch = match self.space {
            SpaceState::WordFlushed => return None,
            SpaceState::Open => self.flush(),
            SpaceState::CharFlushed => None,
        };
        self.space = SpaceState::WordFlushed;

        match ch {
            Some(ch) => {
                self.word_open = false;
                Some(Decoded::CharThenSpace(ch))
            }
            None if self.word_open => {
                self.word_open = false;
                Some(Decoded::Space)
            }
            None => None,
        }
    }

    fn flush(&mut self) -> Option<char> {
        let pattern = self.pattern;
        self.pattern.clear();
        self.commit_speed();

        if core::mem::take(&mut self.overflowed) || pattern.is_empty() {
            return None;
        }

        match table::decode(pattern) {
            Some(ch) => {
                self.word_open = true;
                Some(ch)
            }
            None => {
                log::debug!("decoder: no character for {}", pattern);
                self.misses = self.misses.wrapping_add(1);
                None
            }
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DEFAULT_WPM)
    }
}
