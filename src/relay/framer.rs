//! Relay frame encoding and parsing
//!
//! Wire form is `"<sender><':'><character>"`. Parsing takes the byte right
//! after the *last* delimiter, so a sender identifier may itself contain the
//! delimiter. A frame that contains the local identifier anywhere is our own
//! transmission coming back and is dropped.

use heapless::String;

use crate::config::relay::{DELIMITER, MAX_FRAME_LEN};
use crate::relay::sender_id::SenderId;

/// Encoded relay frame
pub type FrameText = String<MAX_FRAME_LEN>;

/// Why a frame was not produced or accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Longer than `MAX_FRAME_LEN`
    Oversized,
    /// Contains the local identifier
    LoopBack,
    MissingDelimiter,
    /// Nothing before the delimiter
    EmptySender,
    /// Nothing (or NUL) after the delimiter
    MissingPayload,
    /// Payload is not printable ASCII
    InvalidPayload,
    /// Payload is the delimiter itself, which could never be parsed back
    ReservedPayload,
}

/// Build the frame relaying `ch` from `sender`
pub fn frame(sender: &SenderId, ch: char) -> Result<FrameText, FrameError> {
    if !is_printable(ch) {
        return Err(FrameError::InvalidPayload);
    }
    if ch == DELIMITER as char {
        return Err(FrameError::ReservedPayload);
    }

    let mut text = FrameText::new();
    text.push_str(sender.as_str())
        .map_err(|_| FrameError::Oversized)?;
    text.push(DELIMITER as char)
        .map_err(|_| FrameError::Oversized)?;
    text.push(ch).map_err(|_| FrameError::Oversized)?;
    Ok(text)
}

/// Extract the relayed character, or the reason the frame is unusable
pub fn try_parse(text: &[u8], local_id: &str) -> Result<char, FrameError> {
    if text.len() > MAX_FRAME_LEN {
        return Err(FrameError::Oversized);
    }
    if contains(text, local_id.as_bytes()) {
        return Err(FrameError::LoopBack);
    }

    let position = text
        .iter()
        .rposition(|&b| b == DELIMITER)
        .ok_or(FrameError::MissingDelimiter)?;
    if position == 0 {
        return Err(FrameError::EmptySender);
    }

    match text.get(position + 1) {
        None | Some(0) => Err(FrameError::MissingPayload),
        Some(&byte) if is_printable(byte as char) => Ok(byte as char),
        Some(_) => Err(FrameError::InvalidPayload),
    }
}

/// Extract the relayed character. Rejected frames are logged and yield `None`.
pub fn parse(text: &[u8], local_id: &str) -> Option<char> {
    match try_parse(text, local_id) {
        Ok(ch) => Some(ch),
        Err(FrameError::LoopBack) => {
            log::debug!("relay: ignoring own frame");
            None
        }
        Err(e) => {
            log::warn!("relay: dropped frame ({:?}), {} bytes", e, text.len());
            None
        }
    }
}

#[inline]
fn is_printable(ch: char) -> bool {
    ch == ' ' || ch.is_ascii_graphic()
}

/// Substring test; an empty needle suppresses nothing
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> SenderId {
        SenderId::new(text).unwrap()
    }

    #[test]
    fn test_frame_layout() {
        let text = frame(&id("OP1"), 'A').unwrap();
        assert_eq!(text.as_str(), "OP1:A");
    }

    #[test]
    fn test_frame_rejects_unsendable() {
        assert_eq!(frame(&id("OP1"), '\0'), Err(FrameError::InvalidPayload));
        assert_eq!(frame(&id("OP1"), '\n'), Err(FrameError::InvalidPayload));
        assert_eq!(frame(&id("OP1"), 'é'), Err(FrameError::InvalidPayload));
        assert_eq!(frame(&id("OP1"), ':'), Err(FrameError::ReservedPayload));
    }

    #[test]
    fn test_frame_longest_sender_fits() {
        let text = frame(&id("ABCDEFGH"), '?').unwrap();
        assert_eq!(text.len(), MAX_FRAME_LEN);
    }

    #[test]
    fn test_parse_peer_frame() {
        assert_eq!(parse(b"OP1:A", "OP2"), Some('A'));
        assert_eq!(parse(b"OP1: ", "OP2"), Some(' '));
    }

    #[test]
    fn test_parse_suppresses_loop_back() {
        assert_eq!(try_parse(b"OP1:A", "OP1"), Err(FrameError::LoopBack));
        // Substring anywhere, payload included
        assert_eq!(try_parse(b"XOP1Y:A", "OP1"), Err(FrameError::LoopBack));
        assert_eq!(parse(b"OP1:A", "OP1"), None);
    }

    #[test]
    fn test_parse_uses_last_delimiter() {
        assert_eq!(parse(b"W1:AB:K", "OP2"), Some('K'));
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        assert_eq!(parse(b"OP1:AB", "OP2"), Some('A'));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(try_parse(b"OP1A", "OP2"), Err(FrameError::MissingDelimiter));
        assert_eq!(try_parse(b":A", "OP2"), Err(FrameError::EmptySender));
        assert_eq!(try_parse(b"OP1:", "OP2"), Err(FrameError::MissingPayload));
        assert_eq!(try_parse(b"OP1:\0", "OP2"), Err(FrameError::MissingPayload));
        assert_eq!(try_parse(b"OP1:\x07", "OP2"), Err(FrameError::InvalidPayload));
        assert_eq!(try_parse(b"", "OP2"), Err(FrameError::MissingDelimiter));
    }

    #[test]
    fn test_parse_oversized() {
        assert_eq!(
            try_parse(b"K1ABC:XYZ-Online", "OP2"),
            Err(FrameError::Oversized)
        );
    }

    #[test]
    fn test_empty_local_id_suppresses_nothing() {
        assert_eq!(parse(b"OP1:A", ""), Some('A'));
    }
}
