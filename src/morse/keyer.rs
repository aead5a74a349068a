//! Iambic and straight-key keyer state machine.
//!
//! Pure logic, no hardware dependencies. Consumes debounced paddle/key
//! edges, produces key transitions together with the mark or space segment
//! each transition just closed. Fully testable on host.
//!
//! # Iambic Modes
//!
//! - **Mode A**: a paddle's latch is dropped the moment the paddle is released
//! - **Mode B**: latches are held until their element is sent, and releasing
//!   a squeeze sends exactly one element opposite to the one in flight

use heapless::Deque;

use crate::config::morse::DEFAULT_WPM;
use crate::morse::table::Element;
use crate::morse::timing::TimeUnit;

/// Transitions buffered between event delivery and the next tick
const PENDING_TRANSITIONS: usize = 8;

/// Keying discipline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeyerMode {
    /// Mode A: stop as soon as the paddles are released
    IambicA,
    /// Mode B: finish a released squeeze with one opposite element
    #[default]
    IambicB,
    /// Straight key: contact closure is the tone
    Straight,
}

/// Debounced input edge
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEdge {
    PressDit,
    ReleaseDit,
    PressDah,
    ReleaseDah,
    PressStraight,
    ReleaseStraight,
}

/// Input edge with the time it happened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub edge: KeyEdge,
    pub timestamp_ms: u64,
}

impl KeyEvent {
    pub fn new(edge: KeyEdge, timestamp_ms: u64) -> Self {
        Self { edge, timestamp_ms }
    }
}

/// A keyed segment and its length in milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyingAction {
    /// Tone on (mark)
    KeyDown(u32),
    /// Tone off (space)
    KeyUp(u32),
}

impl KeyingAction {
    #[inline]
    pub fn duration_ms(&self) -> u32 {
        match *self {
            KeyingAction::KeyDown(ms) | KeyingAction::KeyUp(ms) => ms,
        }
    }

    #[inline]
    pub fn is_mark(&self) -> bool {
        matches!(self, KeyingAction::KeyDown(_))
    }
}

/// Key output changed state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// New key state
    pub key_down: bool,
    /// When the change took effect
    pub at_ms: u64,
    /// Segment closed by this change. `None` for the first closure after a
    /// reset, when the preceding silence has no start.
    pub completed: Option<KeyingAction>,
}

/// Mode B squeeze memory
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Squeeze {
    /// No squeeze pending
    Open,
    /// Both paddles were squeezed; once they are released this element is
    /// sent exactly once
    Completing(Element),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Key up; `since` is when it went up, if known
    Idle { since: Option<u64> },
    /// Paced element in flight
    Sending { element: Element, start: u64, end: u64 },
    /// Inter-element gap after a paced element
    Gap { start: u64, end: u64 },
    /// Straight key closed
    Held { since: u64 },
}

/// Keyer state machine
///
/// Element and gap lengths are fixed when they start, so a speed change
/// never stretches or clips the element in flight.
///
/// # Example
///
/// ```
/// use morse_relay_trainer::morse::keyer::{KeyEdge, KeyEvent, Keyer, KeyerMode};
///
/// let mut keyer = Keyer::new(KeyerMode::IambicA, 20);
/// keyer.handle(KeyEvent::new(KeyEdge::PressDit, 0));
///
/// let transition = keyer.tick(0).unwrap();
/// assert!(transition.key_down);
/// assert!(keyer.is_key_down());
/// ```
pub struct Keyer {
    mode: KeyerMode,
    unit: TimeUnit,
    phase: Phase,

    // Paddle contacts
    dit_pressed: bool,
    dah_pressed: bool,

    // Latches, armed by a press and consumed when the element starts
    dit_latched: bool,
    dah_latched: bool,

    squeeze: Squeeze,
    last_element: Option<Element>,

    pending: Deque<Transition, PENDING_TRANSITIONS>,
}

impl Keyer {
    /// Create a keyer in `mode` running at `wpm`
    pub fn new(mode: KeyerMode, wpm: u8) -> Self {
        Self {
            mode,
            unit: TimeUnit::from_wpm(wpm),
            phase: Phase::Idle { since: None },
            dit_pressed: false,
            dah_pressed: false,
            dit_latched: false,
            dah_latched: false,
            squeeze: Squeeze::Open,
            last_element: None,
            pending: Deque::new(),
        }
    }

    pub fn mode(&self) -> KeyerMode {
        self.mode
    }

    /// Switch discipline. Any keying state is dropped.
    pub fn set_mode(&mut self, mode: KeyerMode) {
        if self.mode != mode {
            self.mode = mode;
            self.reset();
        }
    }

    /// Change speed. Takes effect from the next element or gap.
    pub fn set_wpm(&mut self, wpm: u8) {
        self.unit = TimeUnit::from_wpm(wpm);
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Apply one input edge
    pub fn handle(&mut self, event: KeyEvent) {
        let at = event.timestamp_ms;
        match (self.mode, event.edge) {
            (KeyerMode::Straight, KeyEdge::PressStraight) => self.straight_closed(at),
            (KeyerMode::Straight, KeyEdge::ReleaseStraight) => self.straight_opened(at),
            (KeyerMode::Straight, _) => {}
            (_, KeyEdge::PressStraight | KeyEdge::ReleaseStraight) => {}
            (_, KeyEdge::PressDit) => self.paddle_pressed(Element::Dit, at),
            (_, KeyEdge::PressDah) => self.paddle_pressed(Element::Dah, at),
            (_, KeyEdge::ReleaseDit) => self.paddle_released(Element::Dit),
            (_, KeyEdge::ReleaseDah) => self.paddle_released(Element::Dah),
        }
    }

    /// Advance to `now_ms` and report the next transition, if any.
    ///
    /// Reports one transition per call; call until it returns `None` to
    /// catch up after a late poll. Paced transitions carry their scheduled
    /// time, not `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Option<Transition> {
        if let Some(transition) = self.pending.pop_front() {
            return Some(transition);
        }

        match self.phase {
            Phase::Sending { element, start, end } if now_ms >= end => {
                self.last_element = Some(element);
                self.phase = Phase::Gap {
                    start: end,
                    end: end + u64::from(self.unit.ms()),
                };
                Some(Transition {
                    key_down: false,
                    at_ms: end,
                    completed: Some(KeyingAction::KeyDown(span(start, end))),
                })
            }
            Phase::Gap { start, end } if now_ms >= end => match self.decide_next() {
                Some(element) => {
                    self.begin(element, end);
                    Some(Transition {
                        key_down: true,
                        at_ms: end,
                        completed: Some(KeyingAction::KeyUp(span(start, end))),
                    })
                }
                None => {
                    self.phase = Phase::Idle { since: Some(start) };
                    self.squeeze = Squeeze::Open;
                    None
                }
            },
            _ => None,
        }
    }

    /// Check if key output is currently active.
    #[inline]
    pub fn is_key_down(&self) -> bool {
        matches!(self.phase, Phase::Sending { .. } | Phase::Held { .. })
    }

    /// When the key last went up, while it is still up
    pub fn silence_since(&self) -> Option<u64> {
        match self.phase {
            Phase::Idle { since } => since,
            Phase::Gap { start, .. } => Some(start),
            Phase::Sending { .. } | Phase::Held { .. } => None,
        }
    }

    /// Element currently keyed by the paddle logic
    pub fn current_element(&self) -> Option<Element> {
        match self.phase {
            Phase::Sending { element, .. } => Some(element),
            _ => None,
        }
    }

    /// A dit will be considered at the next element boundary
    pub fn dit_latched(&self) -> bool {
        self.dit_pressed || self.dit_latched
    }

    /// A dah will be considered at the next element boundary
    pub fn dah_latched(&self) -> bool {
        self.dah_pressed || self.dah_latched
    }

    pub fn squeeze(&self) -> Squeeze {
        self.squeeze
    }

    /// Drop all keying state and go idle
    pub fn reset(&mut self) {
        self.phase = Phase::Idle { since: None };
        self.dit_pressed = false;
        self.dah_pressed = false;
        self.dit_latched = false;
        self.dah_latched = false;
        self.squeeze = Squeeze::Open;
        self.last_element = None;
        self.pending.clear();
    }

    // --- Private methods ---

    fn paddle_pressed(&mut self, element: Element, at: u64) {
        if self.pressed(element) {
            return;
        }
        self.set_pressed(element, true);
        self.set_latched(element, true);

        match self.phase {
            Phase::Idle { since } => {
                self.begin(element, at);
                self.push(Transition {
                    key_down: true,
                    at_ms: at,
                    completed: since.map(|since| KeyingAction::KeyUp(span(since, at))),
                });
            }
            Phase::Sending { element: in_flight, .. } => self.note_squeeze(in_flight),
            Phase::Gap { .. } => {
                if let Some(last) = self.last_element {
                    self.note_squeeze(last);
                }
            }
            Phase::Held { .. } => {}
        }
    }

    fn paddle_released(&mut self, element: Element) {
        if !self.pressed(element) {
            return;
        }
        self.set_pressed(element, false);
        if self.mode == KeyerMode::IambicA {
            self.set_latched(element, false);
        }
    }

    fn straight_closed(&mut self, at: u64) {
        if let Phase::Idle { since } = self.phase {
            self.phase = Phase::Held { since: at };
            self.push(Transition {
                key_down: true,
                at_ms: at,
                completed: since.map(|since| KeyingAction::KeyUp(span(since, at))),
            });
        }
    }

    fn straight_opened(&mut self, at: u64) {
        if let Phase::Held { since } = self.phase {
            self.phase = Phase::Idle { since: Some(at) };
            self.push(Transition {
                key_down: false,
                at_ms: at,
                completed: Some(KeyingAction::KeyDown(span(since, at))),
            });
        }
    }

    /// Mode B: while both paddles are closed, remember the element opposite
    /// to `reference` for completion after release
    fn note_squeeze(&mut self, reference: Element) {
        if self.mode == KeyerMode::IambicB && self.dit_pressed && self.dah_pressed {
            self.squeeze = Squeeze::Completing(reference.opposite());
        }
    }

    fn decide_next(&mut self) -> Option<Element> {
        // Priority 1: released squeeze completion (Mode B only)
        if !(self.dit_pressed && self.dah_pressed) {
            if let Squeeze::Completing(element) = self.squeeze {
                self.squeeze = Squeeze::Open;
                // Presses made during the squeeze are spent by the completion
                self.set_latched(element.opposite(), false);
                return Some(element);
            }
        }

        // Priority 2: held paddles and latches
        match (self.dit_latched(), self.dah_latched()) {
            (true, true) => Some(self.last_element.map_or(Element::Dit, Element::opposite)),
            (true, false) => Some(Element::Dit),
            (false, true) => Some(Element::Dah),
            (false, false) => None,
        }
    }

    fn begin(&mut self, element: Element, at: u64) {
        let duration = self.unit.element(element);
        self.phase = Phase::Sending {
            element,
            start: at,
            end: at + u64::from(duration),
        };
        self.set_latched(element, false);

        if self.squeeze == Squeeze::Completing(element) {
            self.squeeze = Squeeze::Open;
        }
        self.note_squeeze(element);
    }

    fn push(&mut self, transition: Transition) {
        if let Err(transition) = self.pending.push_back(transition) {
            // Nobody is ticking; keep the newest edges
            log::warn!("keyer: transition backlog full, dropping oldest");
            let _ = self.pending.pop_front();
            let _ = self.pending.push_back(transition);
        }
    }

    fn pressed(&self, element: Element) -> bool {
        match element {
            Element::Dit => self.dit_pressed,
            Element::Dah => self.dah_pressed,
        }
    }

    fn set_pressed(&mut self, element: Element, pressed: bool) {
        match element {
            Element::Dit => self.dit_pressed = pressed,
            Element::Dah => self.dah_pressed = pressed,
        }
    }

    fn set_latched(&mut self, element: Element, latched: bool) {
        match element {
            Element::Dit => self.dit_latched = latched,
            Element::Dah => self.dah_latched = latched,
        }
    }
}

impl Default for Keyer {
    fn default() -> Self {
        Self::new(KeyerMode::default(), DEFAULT_WPM)
    }
}

/// Milliseconds from `from` to `to`, saturating
#[inline]
fn span(from: u64, to: u64) -> u32 {
    u32::try_from(to.saturating_sub(from)).unwrap_or(u32::MAX)
}
