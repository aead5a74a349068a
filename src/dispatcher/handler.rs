//! Command dispatcher
//!
//! Executes host commands against the running [`Session`] and produces the
//! response to send back.

use crate::commands::types::{Command, Response, ResponseStatus};
use crate::config::protocol;
use crate::relay::RelayTransport;
use crate::session::{Playback, Session};

/// Command dispatcher
pub struct CommandDispatcher;

impl CommandDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Dispatch a command and return the response
    pub fn dispatch<T: RelayTransport, P: Playback>(
        &self,
        session: &mut Session<T, P>,
        command: Command,
    ) -> Response {
        let id = command.id();
        match command {
            Command::GetVersion => self.handle_get_version(),
            Command::Stop => {
                session.stop();
                Response::Ack
            }
            Command::Start => {
                session.start();
                Response::Ack
            }
            Command::SetSpeed { wpm } => Response::Speed {
                wpm: session.set_speed(wpm),
            },
            Command::SetSpacing {
                code_wpm,
                extra_word_spaces,
            } => {
                session.set_spacing(code_wpm, extra_word_spaces);
                Response::Ack
            }
            Command::SetPitch { hz } => Response::Pitch {
                hz: session.set_pitch(hz),
            },
            Command::SetKeyerMode { mode } => {
                session.set_keyer_mode(mode);
                Response::Ack
            }
            Command::SendText { text } => {
                if !session.is_running() {
                    return Response::error(ResponseStatus::NotRunning, id);
                }
                let accepted = session.send_text(&text);
                Response::TextQueued {
                    accepted: u8::try_from(accepted).unwrap_or(u8::MAX),
                }
            }
            Command::GetStats => Response::Stats(session.stats()),
        }
    }

    fn handle_get_version(&self) -> Response {
        log::debug!(
            "Version requested. Responding {}.{}.{}",
            protocol::VERSION_MAJOR,
            protocol::VERSION_MINOR,
            protocol::VERSION_PATCH
        );
        Response::Version {
            major: protocol::VERSION_MAJOR,
            minor: protocol::VERSION_MINOR,
            patch: protocol::VERSION_PATCH,
        }
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
