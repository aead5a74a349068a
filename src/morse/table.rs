//! Static bidirectional Morse code table
//!
//! Both lookup directions are plain array indexing into tables computed at
//! compile time from [`CODE_TABLE`]. A pattern is stored as a marker-prefixed
//! bit string: start from `1`, shift left once per element and set the low
//! bit for a dah. `.-` is therefore `0b101`, and every pattern of up to six
//! elements fits below 128.

use core::fmt;

use crate::config::morse::MAX_PATTERN_LEN;

/// A single keyed element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Element {
    Dit,
    Dah,
}

impl Element {
    /// Get the opposite element.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Element::Dit => Element::Dah,
            Element::Dah => Element::Dit,
        }
    }
}

/// Characters and their patterns. `.` is a dit, `-` a dah.
const CODE_TABLE: [(u8, &str); 53] = [
    (b'A', ".-"),
    (b'B', "-..."),
    (b'C', "-.-."),
    (b'D', "-.."),
    (b'E', "."),
    (b'F', "..-."),
    (b'G', "--."),
    (b'H', "...."),
    (b'I', ".."),
    (b'J', ".---"),
    (b'K', "-.-"),
    (b'L', ".-.."),
    (b'M', "--"),
    (b'N', "-."),
    (b'O', "---"),
    (b'P', ".--."),
    (b'Q', "--.-"),
    (b'R', ".-."),
    (b'S', "..."),
    (b'T', "-"),
    (b'U', "..-"),
    (b'V', "...-"),
    (b'W', ".--"),
    (b'X', "-..-"),
    (b'Y', "-.--"),
    (b'Z', "--.."),
    (b'0', "-----"),
    (b'1', ".----"),
    (b'2', "..---"),
    (b'3', "...--"),
    (b'4', "....-"),
    (b'5', "....."),
    (b'6', "-...."),
    (b'7', "--..."),
    (b'8', "---.."),
    (b'9', "----."),
    (b'.', ".-.-.-"),
    (b',', "--..--"),
    (b'?', "..--.."),
    (b'/', "-..-."),
    (b'=', "-...-"),
    (b'+', ".-.-."),
    (b'-', "-....-"),
    (b':', "---..."),
    (b';', "-.-.-."),
    (b'\'', ".----."),
    (b'(', "-.--."),
    (b')', "-.--.-"),
    (b'"', ".-..-."),
    (b'@', ".--.-."),
    (b'!', "-.-.--"),
    (b'&', ".-..."),
    (b'_', "..--.-"),
];

const fn pattern_code(pattern: &str) -> u8 {
    let bytes = pattern.as_bytes();
    assert!(!bytes.is_empty() && bytes.len() <= MAX_PATTERN_LEN, "pattern length out of range");

    let mut code = 1u8;
    let mut i = 0;
    while i < bytes.len() {
        let bit = match bytes[i] {
            b'.' => 0,
            b'-' => 1,
            _ => panic!("pattern must contain only '.' and '-'"),
        };
        code = (code << 1) | bit;
        i += 1;
    }
    code
}

const fn build_decode_table() -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < CODE_TABLE.len() {
        let code = pattern_code(CODE_TABLE[i].1) as usize;
        assert!(table[code] == 0, "duplicate pattern in code table");
        table[code] = CODE_TABLE[i].0;
        i += 1;
    }
    table
}

const fn build_encode_table() -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < CODE_TABLE.len() {
        let ch = CODE_TABLE[i].0 as usize;
        assert!(table[ch] == 0, "duplicate character in code table");
        table[ch] = pattern_code(CODE_TABLE[i].1);
        i += 1;
    }
    table
}

static DECODE: [u8; 128] = build_decode_table();
static ENCODE: [u8; 128] = build_encode_table();

/// Ordered dit/dah sequence of one character (0 to 6 elements)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MorsePattern {
    code: u8,
}

impl MorsePattern {
    /// Empty pattern
    pub const fn new() -> Self {
        Self { code: 1 }
    }

    /// Parse a `.`/`-` string, `None` if it is empty, too long or invalid
    pub fn parse(text: &str) -> Option<Self> {
        let mut pattern = Self::new();
        for byte in text.bytes() {
            let element = match byte {
                b'.' => Element::Dit,
                b'-' => Element::Dah,
                _ => return None,
            };
            pattern.push(element).ok()?;
        }
        (!pattern.is_empty()).then_some(pattern)
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        (7 - self.code.leading_zeros()) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code == 1
    }

    /// Append an element; hands it back if the pattern is already full
    pub fn push(&mut self, element: Element) -> Result<(), Element> {
        if self.len() >= MAX_PATTERN_LEN {
            return Err(element);
        }
        self.code = (self.code << 1) | u8::from(element == Element::Dah);
        Ok(())
    }

    /// Elements in keying order
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        let code = self.code;
        (0..self.len()).rev().map(move |shift| {
            if (code >> shift) & 1 == 1 {
                Element::Dah
            } else {
                Element::Dit
            }
        })
    }

    pub fn clear(&mut self) {
        self.code = 1;
    }
}

impl Default for MorsePattern {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MorsePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in self.elements() {
            f.write_str(match element {
                Element::Dit => ".",
                Element::Dah => "-",
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for MorsePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MorsePattern({})", self)
    }
}

/// Pattern for a character; lower-case letters are accepted
pub fn encode(ch: char) -> Option<MorsePattern> {
    if !ch.is_ascii() {
        return None;
    }
    let code = ENCODE[ch.to_ascii_uppercase() as usize];
    (code != 0).then_some(MorsePattern { code })
}

/// Character for a pattern, `None` if the table has no entry
pub fn decode(pattern: MorsePattern) -> Option<char> {
    let ch = DECODE[pattern.code as usize];
    (ch != 0).then_some(ch as char)
}

/// Every character the table knows, in table order
pub fn alphabet() -> impl Iterator<Item = char> {
    CODE_TABLE.iter().map(|&(ch, _)| ch as char)
}
