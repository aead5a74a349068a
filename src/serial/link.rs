//! Host control link
//!
//! Services the serial port from the polling loop: reads whatever bytes are
//! waiting, runs each complete command against the session and writes the
//! COBS-framed response back.

use crate::commands::serialiser::ResponseSerialiser;
use crate::commands::types::Response;
use crate::dispatcher::CommandDispatcher;
use crate::relay::RelayTransport;
use crate::serial::reader::{CommandReader, ReadResult};
use crate::serial::traits::SerialPort;
use crate::session::{Origin, Playback, Session};

/// Bytes pulled from the port per read call
const READ_CHUNK: usize = 64;

/// Reads per poll, bounds the time spent on a chatty host
const MAX_READS_PER_POLL: usize = 4;

pub struct HostLink {
    reader: CommandReader,
    dispatcher: CommandDispatcher,
    serialiser: ResponseSerialiser,
    write_errors: u32,
}

impl HostLink {
    pub fn new() -> Self {
        Self {
            reader: CommandReader::new(),
            dispatcher: CommandDispatcher::new(),
            serialiser: ResponseSerialiser::new(),
            write_errors: 0,
        }
    }

    /// Read pending bytes from `port` and answer every complete command
    pub fn poll<S, T, P>(&mut self, port: &mut S, session: &mut Session<T, P>)
    where
        S: SerialPort,
        T: RelayTransport,
        P: Playback,
    {
        let mut buf = [0u8; READ_CHUNK];
        for _ in 0..MAX_READS_PER_POLL {
            let count = match port.read(&mut buf) {
                Ok(0) => break,
                Ok(count) => count,
                Err(e) => {
                    log::warn!("host link: read failed: {:?}", e);
                    self.reader.reset();
                    break;
                }
            };
            self.receive(buf.get(..count).unwrap_or(&buf), port, session);
        }
    }

    /// Process bytes already read from the host
    pub fn receive<S, T, P>(&mut self, bytes: &[u8], port: &mut S, session: &mut Session<T, P>)
    where
        S: SerialPort,
        T: RelayTransport,
        P: Playback,
    {
        for &byte in bytes {
            let response = match self.reader.push(byte) {
                Some(ReadResult::Command(command)) => self.dispatcher.dispatch(session, command),
                Some(ReadResult::ParseError(status, command_id)) => {
                    Response::error_raw(status, command_id)
                }
                None => continue,
            };
            self.send(port, &response);
        }
    }

    /// Tell the host about a displayed character
    pub fn notify_decoded<S: SerialPort>(&mut self, port: &mut S, ch: char, origin: Origin) {
        if let Some(response) = Response::decoded(ch, origin) {
            self.send(port, &response);
        }
    }

    /// Serialise and write one response
    pub fn send<S: SerialPort>(&mut self, port: &mut S, response: &Response) {
        let frame = self.serialiser.serialise(response);
        if let Err(e) = port.write(&frame) {
            self.write_errors = self.write_errors.wrapping_add(1);
            log::warn!("host link: write failed: {:?}", e);
        }
    }

    /// Frames dropped before parsing
    pub fn discarded(&self) -> u32 {
        self.reader.discarded()
    }

    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }
}

impl Default for HostLink {
    fn default() -> Self {
        Self::new()
    }
}
