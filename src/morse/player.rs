//! Non-blocking playback of characters as keyed tone
//!
//! A character is expanded into a short schedule of [`KeyingAction`]s and
//! stepped through from the polling loop; nothing here waits.

use heapless::Vec;

use crate::config::morse::MAX_PATTERN_LEN;
use crate::morse::keyer::KeyingAction;
use crate::morse::table;
use crate::morse::timing::Spacing;

/// Mark and trailing space for every element
pub const MAX_SCHEDULE: usize = MAX_PATTERN_LEN * 2;

pub type Schedule = Vec<KeyingAction, MAX_SCHEDULE>;

/// Keying schedule for one character, `None` if it cannot be sent.
///
/// A character ends with a character gap. A space only adds what the word
/// gap needs beyond the character gap already sent.
pub fn schedule(ch: char, spacing: &Spacing) -> Option<Schedule> {
    let mut actions = Schedule::new();

    if ch == ' ' {
        let extra = spacing.word_gap_ms.saturating_sub(spacing.char_gap_ms);
        actions.push(KeyingAction::KeyUp(extra)).ok()?;
        return Some(actions);
    }

    let pattern = table::encode(ch)?;
    let count = pattern.len();
    for (i, element) in pattern.elements().enumerate() {
        let gap = if i + 1 == count {
            spacing.char_gap_ms
        } else {
            spacing.unit.ms()
        };
        actions.push(KeyingAction::KeyDown(spacing.unit.element(element))).ok()?;
        actions.push(KeyingAction::KeyUp(gap)).ok()?;
    }
    Some(actions)
}

/// Steps through a schedule against the clock
#[derive(Debug, Default)]
pub struct Player {
    schedule: Schedule,
    index: usize,
    segment_end: u64,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin playing `ch` at `now_ms`. Returns `false` (and plays nothing)
    /// if the character has no Morse representation.
    pub fn start(&mut self, ch: char, spacing: &Spacing, now_ms: u64) -> bool {
        let Some(schedule) = schedule(ch, spacing) else {
            log::debug!("player: nothing to key for {:?}", ch);
            return false;
        };
        let first = schedule.first().map_or(0, KeyingAction::duration_ms);

        self.schedule = schedule;
        self.index = 0;
        self.segment_end = now_ms + u64::from(first);
        true
    }

    /// Advance to `now_ms`
    pub fn tick(&mut self, now_ms: u64) {
        while self.is_busy() && now_ms >= self.segment_end {
            self.index += 1;
            if let Some(action) = self.schedule.get(self.index) {
                self.segment_end += u64::from(action.duration_ms());
            }
        }
    }

    /// Tone should currently be sounding
    pub fn tone(&self) -> bool {
        self.schedule
            .get(self.index)
            .is_some_and(KeyingAction::is_mark)
    }

    pub fn is_busy(&self) -> bool {
        self.index < self.schedule.len()
    }

    /// Abandon the character in progress
    pub fn cancel(&mut self) {
        self.schedule.clear();
        self.index = 0;
    }
}
