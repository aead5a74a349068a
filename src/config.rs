//! Timing, relay and host-link constants for the Morse relay trainer

/// Morse timing limits and defaults
pub mod morse {
    /// Slowest supported speed in words per minute
    pub const MIN_WPM: u8 = 3;
    /// Fastest supported speed in words per minute
    pub const MAX_WPM: u8 = 50;
    /// Character speed used when nothing else is configured
    pub const DEFAULT_WPM: u8 = 13;

    /// PARIS timing: one unit lasts `1200 / wpm` milliseconds
    pub const MS_PER_UNIT_AT_1WPM: u32 = 1200;

    /// Longest pattern in the code table (elements)
    pub const MAX_PATTERN_LEN: usize = 6;

    /// Decoder thresholds, in units
    pub const DAH_THRESHOLD_UNITS: u32 = 2;
    pub const CHAR_GAP_THRESHOLD_UNITS: u32 = 2;
    pub const WORD_GAP_THRESHOLD_UNITS: u32 = 5;

    /// Upper bound for extra word spacing (in whole word spaces)
    pub const MAX_EXTRA_WORD_SPACES: u8 = 99;
}

/// Sidetone defaults
pub mod tone {
    pub const DEFAULT_PITCH_HZ: u16 = 1200;
    pub const MIN_PITCH_HZ: u16 = 300;
    pub const MAX_PITCH_HZ: u16 = 2800;
}

/// Relay framing and queueing
pub mod relay {
    /// Separates the sender identifier from the payload character
    pub const DELIMITER: u8 = b':';

    /// Longest sender identifier we generate or accept for ourselves
    pub const MAX_SENDER_ID_LEN: usize = 8;

    /// Longest relay frame accepted on the wire
    pub const MAX_FRAME_LEN: usize = MAX_SENDER_ID_LEN + 2;

    /// Receive buffer handed to the transport; longer messages are refused
    pub const RX_BUFFER_SIZE: usize = 64;

    /// Longest relay channel ("room") name
    pub const MAX_CHANNEL_LEN: usize = 30;

    /// Channel joined when none is configured
    pub const DEFAULT_CHANNEL: &str = "morse";

    /// Slots in each relay queue (one slot separates full from empty)
    pub const QUEUE_SLOTS: usize = 101;

    /// Inbound messages drained per poll, keeps keying jitter bounded
    pub const MAX_INBOUND_PER_POLL: usize = 4;

    /// Frames published per poll
    pub const MAX_OUTBOUND_PER_POLL: usize = 4;

    /// Greeting queued for the peer when the channel comes up
    pub const GREETING: &str = " CQ ";
}

/// Host serial link constants
pub mod protocol {
    /// Frame delimiter for COBS encoding
    pub const FRAME_DELIMITER: u8 = 0x00;

    /// Maximum frame size
    pub const MAX_FRAME_SIZE: usize = 256;

    /// Maximum text payload of a SendText command
    pub const MAX_TEXT_PAYLOAD: usize = 128;

    /// Protocol version (increment when message format changes)
    pub const PROTOCOL_VERSION: u8 = 1;

    /// Firmware version
    pub const VERSION_MAJOR: u8 = 0;
    pub const VERSION_MINOR: u8 = 1;
    pub const VERSION_PATCH: u8 = 0;
}
