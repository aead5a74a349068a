#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod morse;
pub mod protocol;
pub mod relay;
pub mod serial;
pub mod session;
