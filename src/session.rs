//! Practice session: keyer, decoder, relay and playback wired together
//!
//! Everything runs from [`Session::poll`], called often (every millisecond or
//! so) from a single loop. One poll:
//!
//! 1. advances the keyer and feeds completed segments, plus any running
//!    silence, to the decoder; decoded characters are echoed and queued for
//!    relay
//! 2. publishes queued frames while the transport is connected
//! 3. drains a bounded number of inbound messages into the inbound queue
//! 4. starts playback of the next received character once the player is idle
//!
//! Nothing blocks. Polling with nothing pending changes nothing.

use heapless::String;

use crate::clock::Clock;
use crate::config::morse::{DEFAULT_WPM, MAX_EXTRA_WORD_SPACES, MAX_WPM, MIN_WPM};
use crate::config::relay::{
    DEFAULT_CHANNEL, GREETING, MAX_CHANNEL_LEN, MAX_INBOUND_PER_POLL, MAX_OUTBOUND_PER_POLL,
    RX_BUFFER_SIZE,
};
use crate::config::tone::{DEFAULT_PITCH_HZ, MAX_PITCH_HZ, MIN_PITCH_HZ};
use crate::morse::{Decoded, Decoder, KeyEvent, Keyer, KeyerMode, Player, Spacing};
use crate::relay::framer::{self, FrameError};
use crate::relay::{Direction, RelayQueues, RelayTransport, SenderId};

/// Where a displayed character came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Keyed here, or typed on the host link
    Local,
    /// Relayed from another station
    Remote,
}

/// Audio and display collaborator
pub trait Playback {
    /// Sidetone on or off
    fn tone(&mut self, on: bool);

    fn set_pitch(&mut self, hz: u16);

    /// Show a character
    fn echo(&mut self, ch: char, origin: Origin);

    /// A relayed character arrived (activity LED)
    fn received(&mut self) {}
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Element speed
    pub char_wpm: u8,
    /// Overall speed; below `char_wpm` the gaps are stretched (Farnsworth)
    pub code_wpm: u8,
    pub pitch_hz: u16,
    pub keyer_mode: KeyerMode,
    /// Additional word gaps after each word during playback
    pub extra_word_spaces: u8,
    /// Our identifier in relay frames
    pub sender_id: SenderId,
    /// Relay channel name
    pub channel: String<MAX_CHANNEL_LEN>,
}

impl SessionConfig {
    pub fn new(sender_id: SenderId) -> Self {
        let mut channel = String::new();
        let _ = channel.push_str(DEFAULT_CHANNEL);

        Self {
            char_wpm: DEFAULT_WPM,
            code_wpm: DEFAULT_WPM,
            pitch_hz: DEFAULT_PITCH_HZ,
            keyer_mode: KeyerMode::default(),
            extra_word_spaces: 0,
            sender_id,
            channel,
        }
    }

    fn spacing(&self) -> Spacing {
        Spacing::farnsworth(self.char_wpm, self.code_wpm, self.extra_word_spaces)
    }
}

impl Default for SessionConfig {
    /// Defaults with the placeholder identifier `AAA`; real devices derive
    /// theirs with [`SenderId::from_device_id`]
    fn default() -> Self {
        Self::new(SenderId::from_device_id([0; 3]))
    }
}

/// Relay and decode counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Frames published
    pub sent: u32,
    /// Characters accepted from peers
    pub received: u32,
    /// Our own frames echoed back by the channel
    pub loop_back: u32,
    /// Inbound frames that failed to parse
    pub malformed: u32,
    pub publish_failures: u32,
    pub receive_errors: u32,
    /// Characters lost to a full outbound queue
    pub outbound_overruns: u32,
    /// Characters lost to a full inbound queue
    pub inbound_overruns: u32,
    /// Keyed patterns that matched no character
    pub decode_misses: u32,
    /// Keyed patterns that ran past the longest character
    pub decode_overflows: u32,
}

/// One station's practice session
pub struct Session<T: RelayTransport, P: Playback> {
    config: SessionConfig,
    spacing: Spacing,
    transport: T,
    playback: P,

    keyer: Keyer,
    decoder: Decoder,
    player: Player,
    queues: RelayQueues,

    running: bool,
    connected: bool,
    tone_on: bool,
    stats: RelayStats,
}

impl<T: RelayTransport, P: Playback> Session<T, P> {
    pub fn new(config: SessionConfig, transport: T, mut playback: P) -> Self {
        let pitch = config.pitch_hz.clamp(MIN_PITCH_HZ, MAX_PITCH_HZ);
        playback.set_pitch(pitch);

        Self {
            spacing: config.spacing(),
            keyer: Keyer::new(config.keyer_mode, config.char_wpm),
            decoder: Decoder::new(config.char_wpm),
            config: SessionConfig {
                pitch_hz: pitch,
                ..config
            },
            transport,
            playback,
            player: Player::new(),
            queues: RelayQueues::new(),
            running: true,
            connected: false,
            tone_on: false,
            stats: RelayStats::default(),
        }
    }

    /// Run one cycle at `now_ms`
    pub fn poll(&mut self, now_ms: u64) {
        // Connection changes while stopped are picked up after start()
        if !self.running {
            return;
        }

        self.track_connection();
        self.service_keyer(now_ms);
        self.publish_outbound();
        self.receive_inbound();
        self.play_inbound(now_ms);
        self.update_tone();
    }

    /// Run one cycle at the clock's current time
    pub fn service(&mut self, clock: &impl Clock) {
        self.poll(clock.now_ms());
    }

    /// Debounced paddle or key edge from the hardware
    pub fn key_event(&mut self, event: KeyEvent) {
        if self.running {
            self.keyer.handle(event);
        }
    }

    /// Push-style delivery of one relay message
    pub fn on_message(&mut self, bytes: &[u8]) {
        if !self.running {
            log::debug!("session: stopped, dropping inbound message");
            return;
        }

        match framer::try_parse(bytes, self.config.sender_id.as_str()) {
            Ok(ch) => {
                self.stats.received = self.stats.received.wrapping_add(1);
                self.queues.enqueue_inbound(ch);
            }
            Err(FrameError::LoopBack) => {
                self.stats.loop_back = self.stats.loop_back.wrapping_add(1);
                log::debug!("session: ignoring own frame");
            }
            Err(e) => {
                self.stats.malformed = self.stats.malformed.wrapping_add(1);
                log::warn!("session: dropped frame ({:?}), {} bytes", e, bytes.len());
            }
        }
    }

    /// Channel came up: start afresh and greet the peers
    pub fn on_connected(&mut self) {
        self.connected = true;
        self.queues.clear();
        for ch in GREETING.chars() {
            self.queues.enqueue_outbound(ch);
        }
        log::info!(
            "session: {} joined channel {}",
            self.config.sender_id,
            self.config.channel
        );
    }

    /// Channel went down: silence playback and drop what was still to be
    /// played. Outbound characters stay queued.
    pub fn on_disconnected(&mut self) {
        self.connected = false;
        self.player.cancel();
        self.queues.clear_inbound();
        self.update_tone();
        log::info!("session: channel lost");
    }

    /// Queue text for relay and echo it locally.
    ///
    /// Returns how many characters were accepted; characters that cannot be
    /// framed are skipped.
    pub fn send_text(&mut self, text: &str) -> usize {
        if !self.running {
            return 0;
        }

        let mut accepted = 0;
        for ch in text.chars().map(|ch| ch.to_ascii_uppercase()) {
            if framer::frame(&self.config.sender_id, ch).is_err() {
                log::debug!("session: cannot relay {:?}", ch);
                continue;
            }
            self.playback.echo(ch, Origin::Local);
            self.queues.enqueue_outbound(ch);
            accepted += 1;
        }
        accepted
    }

    /// Silence and drop every partial state
    pub fn stop(&mut self) {
        self.running = false;
        self.keyer.reset();
        self.decoder.reset();
        self.player.cancel();
        self.queues.clear();
        self.update_tone();
        log::info!("session: stopped");
    }

    /// Resume keying and relaying
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            log::info!("session: started");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Change the character speed. Returns the speed actually used.
    ///
    /// A character being keyed finishes decoding at the old speed.
    pub fn set_speed(&mut self, wpm: u8) -> u8 {
        let wpm = wpm.clamp(MIN_WPM, MAX_WPM);
        self.config.char_wpm = wpm;
        self.keyer.set_wpm(wpm);
        self.decoder.set_wpm(wpm);
        if !self.keyer.is_key_down() && self.decoder.pending().is_empty() {
            self.decoder.commit_speed();
        }
        self.spacing = self.config.spacing();
        log::debug!("session: speed {} wpm", wpm);
        wpm
    }

    /// Change the overall (Farnsworth) speed and extra word spacing
    pub fn set_spacing(&mut self, code_wpm: u8, extra_word_spaces: u8) {
        self.config.code_wpm = code_wpm.clamp(MIN_WPM, MAX_WPM);
        self.config.extra_word_spaces = extra_word_spaces.min(MAX_EXTRA_WORD_SPACES);
        self.spacing = self.config.spacing();
    }

    /// Change the sidetone pitch. Returns the pitch actually used.
    pub fn set_pitch(&mut self, hz: u16) -> u16 {
        let hz = hz.clamp(MIN_PITCH_HZ, MAX_PITCH_HZ);
        self.config.pitch_hz = hz;
        self.playback.set_pitch(hz);
        hz
    }

    pub fn set_keyer_mode(&mut self, mode: KeyerMode) {
        self.config.keyer_mode = mode;
        self.keyer.set_mode(mode);
        self.update_tone();
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            outbound_overruns: self.queues.queue(Direction::Outbound).overruns(),
            inbound_overruns: self.queues.queue(Direction::Inbound).overruns(),
            decode_misses: self.decoder.misses(),
            decode_overflows: self.decoder.overflows(),
            ..self.stats
        }
    }

    pub fn queues(&self) -> &RelayQueues {
        &self.queues
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    // --- Private methods ---

    fn track_connection(&mut self) {
        let connected = self.transport.is_connected();
        if connected != self.connected {
            if connected {
                self.on_connected();
            } else {
                self.on_disconnected();
            }
        }
    }

    fn service_keyer(&mut self, now_ms: u64) {
        while let Some(transition) = self.keyer.tick(now_ms) {
            let Some(segment) = transition.completed else {
                continue;
            };
            if let Some(decoded) = self
                .decoder
                .observe(segment.duration_ms(), segment.is_mark())
            {
                self.emit_local(decoded);
            }
        }

        if let Some(since) = self.keyer.silence_since() {
            let silence = u32::try_from(now_ms.saturating_sub(since)).unwrap_or(u32::MAX);
            if let Some(decoded) = self.decoder.idle(silence) {
                self.emit_local(decoded);
            }
        }
    }

    fn emit_local(&mut self, decoded: Decoded) {
        for ch in decoded.chars() {
            self.playback.echo(ch, Origin::Local);
            self.queues.enqueue_outbound(ch);
        }
    }

    fn publish_outbound(&mut self) {
        if !self.transport.is_connected() {
            return;
        }

        for _ in 0..MAX_OUTBOUND_PER_POLL {
            let Some(ch) = self.queues.dequeue_outbound() else {
                break;
            };
            let text = match framer::frame(&self.config.sender_id, ch) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("session: cannot frame {:?} ({:?})", ch, e);
                    continue;
                }
            };

            match self.transport.publish(&self.config.channel, text.as_bytes()) {
                Ok(()) => self.stats.sent = self.stats.sent.wrapping_add(1),
                Err(e) => {
                    self.stats.publish_failures = self.stats.publish_failures.wrapping_add(1);
                    log::warn!("session: publish of {:?} failed: {:?}", ch, e);
                }
            }
        }
    }

    fn receive_inbound(&mut self) {
        let mut buf = [0u8; RX_BUFFER_SIZE];
        for _ in 0..MAX_INBOUND_PER_POLL {
            match self.transport.try_receive(&mut buf) {
                Ok(Some(len)) => {
                    let message = buf.get(..len).unwrap_or(&buf);
                    self.on_message(message);
                }
                Ok(None) => break,
                Err(e) => {
                    self.stats.receive_errors = self.stats.receive_errors.wrapping_add(1);
                    log::warn!("session: receive failed: {:?}", e);
                    break;
                }
            }
        }
    }

    fn play_inbound(&mut self, now_ms: u64) {
        self.player.tick(now_ms);
        if self.player.is_busy() {
            return;
        }

        if let Some(ch) = self.queues.dequeue_inbound() {
            self.playback.received();
            self.playback.echo(ch, Origin::Remote);
            self.player.start(ch, &self.spacing, now_ms);
        }
    }

    fn update_tone(&mut self) {
        let on = self.keyer.is_key_down() || self.player.tone();
        if on != self.tone_on {
            self.tone_on = on;
            self.playback.tone(on);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::morse::KeyEdge;
    use crate::relay::transport::mock::MockTransport;
    use crate::relay::TransportError;

    #[derive(Default)]
    struct Recorder {
        tones: Vec<bool>,
        echoes: Vec<(char, Origin)>,
        pitch: Option<u16>,
        received: u32,
    }

    impl Recorder {
        fn echoed(&self, origin: Origin) -> std::string::String {
            self.echoes
                .iter()
                .filter(|(_, o)| *o == origin)
                .map(|(ch, _)| *ch)
                .collect()
        }
    }

    impl Playback for Recorder {
        fn tone(&mut self, on: bool) {
            self.tones.push(on);
        }

        fn set_pitch(&mut self, hz: u16) {
            self.pitch = Some(hz);
        }

        fn echo(&mut self, ch: char, origin: Origin) {
            self.echoes.push((ch, origin));
        }

        fn received(&mut self) {
            self.received += 1;
        }
    }

    fn session(id: &str, wpm: u8) -> Session<MockTransport, Recorder> {
        let mut config = SessionConfig::new(SenderId::new(id).unwrap());
        config.char_wpm = wpm;
        config.code_wpm = wpm;

        let mut session = Session::new(config, MockTransport::new(), Recorder::default());
        // Connect and flush the greeting
        session.poll(0);
        session.transport().clear_published();
        session
    }

    fn published(session: &Session<MockTransport, Recorder>) -> Vec<std::string::String> {
        session
            .transport()
            .published()
            .iter()
            .map(|m| std::string::String::from_utf8(m.to_vec()).unwrap())
            .collect()
    }

    fn run(
        session: &mut Session<MockTransport, Recorder>,
        from: u64,
        to: u64,
        events: &[(u64, KeyEdge)],
    ) {
        for now in from..=to {
            for &(at, edge) in events {
                if at == now {
                    session.key_event(KeyEvent::new(edge, at));
                }
            }
            session.poll(now);
        }
    }

    #[test]
    fn test_greeting_on_connect() {
        let mut config = SessionConfig::new(SenderId::new("OP1").unwrap());
        config.pitch_hz = 5000;
        let mut session = Session::new(config, MockTransport::new(), Recorder::default());
        assert_eq!(session.playback().pitch, Some(MAX_PITCH_HZ));

        session.poll(0);
        assert_eq!(published(&session), ["OP1: ", "OP1:C", "OP1:Q", "OP1: "]);
        assert_eq!(session.transport().last_channel().as_str(), DEFAULT_CHANNEL);
        assert_eq!(session.stats().sent, 4);
    }

    #[test]
    fn test_keyed_character_is_relayed() {
        let mut op1 = session("OP1", 20);

        // Dit 10..70, dah 140..320, then silence
        run(
            &mut op1,
            1,
            700,
            &[
                (10, KeyEdge::PressDit),
                (20, KeyEdge::ReleaseDit),
                (140, KeyEdge::PressDah),
                (150, KeyEdge::ReleaseDah),
            ],
        );

        assert_eq!(published(&op1), ["OP1:A", "OP1: "]);
        assert_eq!(op1.playback().echoed(Origin::Local), "A ");
        assert_eq!(op1.playback().tones, [true, false, true, false]);
    }

    #[test]
    fn test_character_flushed_after_char_gap() {
        let mut op1 = session("OP1", 20);

        // Dah 1..181; two units of silence complete the character
        run(&mut op1, 1, 300, &[(1, KeyEdge::PressDah), (10, KeyEdge::ReleaseDah)]);
        assert!(published(&op1).is_empty());
        op1.poll(301);
        assert_eq!(published(&op1), ["OP1:T"]);
    }

    #[test]
    fn test_received_frame_is_played() {
        let mut op2 = session("OP2", 20);

        op2.transport().deliver(b"OP1:A");
        run(&mut op2, 1, 600, &[]);

        assert_eq!(op2.playback().echoes, [('A', Origin::Remote)]);
        assert_eq!(op2.playback().received, 1);
        assert_eq!(op2.playback().tones, [true, false, true, false]);
        assert_eq!(op2.stats().received, 1);
        assert!(published(&op2).is_empty());
    }

    #[test]
    fn test_end_to_end_between_stations() {
        let mut op1 = session("OP1", 20);
        let mut op2 = session("OP2", 20);

        run(
            &mut op1,
            1,
            700,
            &[
                (10, KeyEdge::PressDit),
                (20, KeyEdge::ReleaseDit),
                (140, KeyEdge::PressDah),
                (150, KeyEdge::ReleaseDah),
            ],
        );

        // The channel carries every frame to both stations
        for frame in op1.transport().published() {
            op1.transport().deliver(&frame);
            op2.transport().deliver(&frame);
        }
        run(&mut op1, 701, 1_500, &[]);
        run(&mut op2, 701, 1_500, &[]);

        assert_eq!(op2.playback().echoed(Origin::Remote), "A ");
        assert_eq!(op1.playback().echoed(Origin::Remote), "");
        assert_eq!(op1.stats().loop_back, 2);
    }

    #[test]
    fn test_malformed_frames_counted() {
        let mut op2 = session("OP2", 20);
        op2.transport().deliver(b"no delimiter");
        op2.transport().deliver(b"OP1:");
        op2.poll(1);

        let stats = op2.stats();
        assert_eq!(stats.malformed, 2);
        assert_eq!(stats.received, 0);
        assert!(op2.playback().echoes.is_empty());
    }

    #[test]
    fn test_inbound_drain_is_bounded() {
        let mut op2 = session("OP2", 20);
        for _ in 0..10 {
            op2.transport().deliver(b"OP1:E");
        }

        op2.poll(1);
        assert_eq!(op2.stats().received, MAX_INBOUND_PER_POLL as u32);
        op2.poll(2);
        assert_eq!(op2.stats().received, 2 * MAX_INBOUND_PER_POLL as u32);
    }

    #[test]
    fn test_receive_error_counted() {
        let mut op2 = session("OP2", 20);
        op2.transport()
            .set_next_receive_error(TransportError::ReceiveFailed);
        op2.poll(1);
        assert_eq!(op2.stats().receive_errors, 1);
    }

    #[test]
    fn test_publish_failure_counted() {
        let mut op1 = session("OP1", 20);
        op1.transport()
            .set_next_publish_error(TransportError::PublishFailed);

        assert_eq!(op1.send_text("ab"), 2);
        op1.poll(1);

        assert_eq!(published(&op1), ["OP1:B"]);
        let stats = op1.stats();
        assert_eq!(stats.publish_failures, 1);
        assert_eq!(stats.sent, 5);
    }

    #[test]
    fn test_send_text_echoes_and_skips_unsendable() {
        let mut op1 = session("OP1", 20);

        assert_eq!(op1.send_text("k:\n1"), 2);
        assert_eq!(op1.playback().echoed(Origin::Local), "K1");
        op1.poll(1);
        assert_eq!(published(&op1), ["OP1:K", "OP1:1"]);
    }

    #[test]
    fn test_outbound_waits_while_disconnected() {
        let mut op1 = session("OP1", 20);
        op1.transport().set_connected(false);
        op1.poll(1);

        op1.send_text("CQ");
        op1.poll(2);
        assert!(published(&op1).is_empty());
        assert_eq!(op1.queues().queue(Direction::Outbound).len(), 2);
        assert_eq!(op1.stats().publish_failures, 0);

        // Reconnecting starts afresh with the greeting
        op1.transport().set_connected(true);
        op1.poll(3);
        assert_eq!(published(&op1), ["OP1: ", "OP1:C", "OP1:Q", "OP1: "]);
    }

    #[test]
    fn test_outbound_overrun_reported() {
        let mut op1 = session("OP1", 20);
        op1.transport().set_connected(false);
        op1.poll(1);

        let text: std::string::String = core::iter::repeat('E').take(105).collect();
        op1.send_text(&text);

        let stats = op1.stats();
        assert_eq!(stats.outbound_overruns, 5);
        assert_eq!(op1.queues().queue(Direction::Outbound).len(), 100);
    }

    #[test]
    fn test_stop_silences_and_clears() {
        let mut op2 = session("OP2", 20);
        op2.transport().deliver(b"OP1:T");
        op2.poll(1);
        assert_eq!(op2.playback().tones, [true]);

        op2.send_text("ABC");
        op2.stop();
        assert_eq!(op2.playback().tones, [true, false]);
        assert!(op2.queues().queue(Direction::Outbound).is_empty());
        assert!(op2.queues().queue(Direction::Inbound).is_empty());

        // Stopped: keying and relaying are ignored
        op2.key_event(KeyEvent::new(KeyEdge::PressDit, 5));
        op2.transport().deliver(b"OP1:E");
        op2.poll(5);
        assert_eq!(op2.send_text("X"), 0);
        assert_eq!(op2.playback().tones, [true, false]);
        assert!(published(&op2).is_empty());

        op2.start();
        assert!(op2.is_running());
        op2.key_event(KeyEvent::new(KeyEdge::PressDit, 10));
        op2.poll(10);
        assert_eq!(op2.playback().tones, [true, false, true]);
    }

    #[test]
    fn test_stop_discards_partial_character() {
        let mut op1 = session("OP1", 20);

        // Dit 10..70, stopped during the following gap
        run(&mut op1, 1, 79, &[(10, KeyEdge::PressDit), (20, KeyEdge::ReleaseDit)]);
        op1.stop();
        run(&mut op1, 80, 89, &[]);
        op1.start();

        // Dah 100..280 on its own is a T, not the A the dit would make
        run(&mut op1, 90, 700, &[(100, KeyEdge::PressDah), (110, KeyEdge::ReleaseDah)]);
        assert_eq!(op1.playback().echoed(Origin::Local), "T ");
        assert_eq!(published(&op1), ["OP1:T", "OP1: "]);
    }

    #[test]
    fn test_speed_change_mid_element_keeps_element() {
        let mut op1 = session("OP1", 20);

        // Dit 10..70 keyed at 20 wpm; 50 wpm requested while it sounds
        run(&mut op1, 1, 20, &[(10, KeyEdge::PressDit), (20, KeyEdge::ReleaseDit)]);
        op1.set_speed(50);
        run(&mut op1, 21, 1_000, &[]);

        assert_eq!(op1.playback().echoed(Origin::Local), "E ");
        assert_eq!(published(&op1), ["OP1:E", "OP1: "]);
    }

    #[test]
    fn test_speed_change_between_characters_is_immediate() {
        let mut op1 = session("OP1", 20);
        op1.set_speed(50);

        // 24 ms unit: a 60 ms mark is already a dah
        op1.set_keyer_mode(KeyerMode::Straight);
        run(
            &mut op1,
            1,
            400,
            &[(10, KeyEdge::PressStraight), (70, KeyEdge::ReleaseStraight)],
        );
        assert_eq!(published(&op1), ["OP1:T", "OP1: "]);
    }

    #[test]
    fn test_reconnect_while_stopped_waits_for_start() {
        let mut op1 = session("OP1", 20);
        op1.stop();

        op1.transport().set_connected(false);
        op1.poll(1);
        op1.transport().set_connected(true);
        op1.poll(2);
        assert!(op1.queues().queue(Direction::Outbound).is_empty());

        op1.transport().set_connected(false);
        op1.poll(3);
        op1.start();
        op1.poll(4);
        assert!(published(&op1).is_empty());

        // Only a reconnect seen while running greets
        op1.transport().set_connected(true);
        op1.poll(5);
        assert_eq!(published(&op1), ["OP1: ", "OP1:C", "OP1:Q", "OP1: "]);
    }

    #[test]
    fn test_disconnect_cancels_playback() {
        let mut op2 = session("OP2", 20);
        op2.transport().deliver(b"OP1:T");
        op2.poll(1);
        assert_eq!(op2.playback().tones, [true]);

        op2.transport().set_connected(false);
        op2.poll(2);
        assert_eq!(op2.playback().tones, [true, false]);
    }

    #[test]
    fn test_set_speed_clamps() {
        let mut op1 = session("OP1", 20);
        assert_eq!(op1.set_speed(200), MAX_WPM);
        assert_eq!(op1.config().char_wpm, MAX_WPM);
        assert_eq!(op1.set_speed(0), MIN_WPM);
        assert_eq!(op1.set_pitch(100), MIN_PITCH_HZ);
        assert_eq!(op1.playback().pitch, Some(MIN_PITCH_HZ));
    }

    #[test]
    fn test_farnsworth_spacing_stretches_playback() {
        let mut op2 = session("OP2", 20);
        op2.set_spacing(5, 0);
        assert_eq!(op2.config().code_wpm, 5);

        op2.transport().deliver(b"OP1:E");
        op2.transport().deliver(b"OP1:E");
        run(&mut op2, 1, 500, &[]);
        // The stretched character gap keeps the second E waiting
        assert_eq!(op2.playback().received, 1);
    }

    #[test]
    fn test_straight_key_mode() {
        let mut op1 = session("OP1", 20);
        op1.set_keyer_mode(KeyerMode::Straight);

        run(
            &mut op1,
            1,
            400,
            &[
                (10, KeyEdge::PressStraight),
                (70, KeyEdge::ReleaseStraight),
                (130, KeyEdge::PressStraight),
                (190, KeyEdge::ReleaseStraight),
            ],
        );
        assert_eq!(published(&op1), ["OP1:I"]);
    }

    #[test]
    fn test_service_uses_clock() {
        let mut op2 = session("OP2", 20);
        let clock = ManualClock::new(1);

        op2.transport().deliver(b"OP1:E");
        op2.service(&clock);
        assert_eq!(op2.playback().tones, [true]);

        clock.advance(60);
        op2.service(&clock);
        assert_eq!(op2.playback().tones, [true, false]);
    }

    #[test]
    fn test_idle_poll_changes_nothing() {
        let mut op1 = session("OP1", 20);
        let before = op1.stats();
        run(&mut op1, 1, 1_000, &[]);

        assert_eq!(op1.stats(), before);
        assert!(op1.playback().tones.is_empty());
        assert!(published(&op1).is_empty());
    }
}
