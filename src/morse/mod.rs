//! Morse timing engine: code table, keyer, decoder and playback

pub mod decoder;
pub mod keyer;
pub mod player;
pub mod table;
pub mod timing;

pub use decoder::{Decoded, Decoder};
pub use keyer::{KeyEdge, KeyEvent, Keyer, KeyerMode, KeyingAction, Transition};
pub use player::Player;
pub use table::{Element, MorsePattern};
pub use timing::{Spacing, TimeUnit};
