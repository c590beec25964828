//! Per-connection session orchestration.
//!
//! A session buffers streamed audio and, when the client signals that the
//! utterance is complete, runs one turn:
//!
//! ```text
//! Idle ──stop──▶ Transcribing ──▶ Responding ──▶ Synthesizing ──▶ Idle
//!                     │               │      └──▶ Skipped ──────▶ Idle
//!                     └───────────────┴── failure ──────────────▶ Idle
//! ```
//!
//! Every stage failure is converted into a fixed marker message for the
//! client. Send failures are logged and swallowed; a turn never fails the
//! session. At most one turn runs per session: a stop that arrives while a
//! turn is in flight is dropped and its audio stays buffered for the next one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use sawt_core::audio;
use sawt_core::errors::{AppError, StageError};
use sawt_core::events::{markers, OutboundMessage, StatusEvent};
use sawt_core::ids::{ConnectionId, TurnId};
use sawt_core::stages::{Stages, TurnResult};

use crate::buffer::FrameBuffer;
use crate::transport::Transport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Transcribing,
    Responding,
    Synthesizing,
    /// The reply was not addressed to the agent; nothing is spoken.
    Skipped,
}

/// How a stop signal was resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing was buffered; no events were sent.
    Empty,
    /// A turn was already running; the signal was dropped.
    Busy,
    TranscriptionFailed(StageError),
    ResponseFailed(StageError),
    /// Not directed at the agent, or an empty reply.
    Ignored,
    SynthesisFailed(StageError),
    Completed(TurnResult),
}

pub struct Session {
    id: ConnectionId,
    buffer: FrameBuffer,
    transport: Arc<dyn Transport>,
    stages: Stages,
    busy: AtomicBool,
    state: Mutex<TurnState>,
    turns: AtomicU64,
}

/// A claimed turn whose audio has already been taken from the buffer.
///
/// Holding one keeps the session busy; dropping it, whether or not
/// [`PendingTurn::run`] completed, returns the session to `Idle`.
pub struct PendingTurn {
    session: Arc<Session>,
    turn_id: TurnId,
    pcm: Bytes,
}

impl PendingTurn {
    pub fn turn_id(&self) -> &TurnId {
        &self.turn_id
    }

    /// Run transcription, response and synthesis over the claimed audio.
    pub async fn run(mut self) -> TurnOutcome {
        let pcm = std::mem::take(&mut self.pcm);
        let outcome = self.session.run_turn(pcm).await;
        debug!(
            connection_id = %self.session.id,
            turn_id = %self.turn_id,
            outcome = outcome_kind(&outcome),
            "turn finished"
        );
        outcome
    }
}

impl Drop for PendingTurn {
    fn drop(&mut self) {
        self.session.set_state(TurnState::Idle);
        self.session.busy.store(false, Ordering::Release);
    }
}

impl Session {
    pub fn new(id: ConnectionId, transport: Arc<dyn Transport>, stages: Stages) -> Self {
        Self {
            id,
            buffer: FrameBuffer::new(),
            transport,
            stages,
            busy: AtomicBool::new(false),
            state: Mutex::new(TurnState::Idle),
            turns: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn state(&self) -> TurnState {
        *self.state.lock()
    }

    /// Number of turns that got past the empty-buffer check.
    pub fn turns_started(&self) -> u64 {
        self.turns.load(Ordering::Relaxed)
    }

    pub fn buffered_bytes(&self) -> usize {
        self.buffer.buffered_bytes()
    }

    pub fn append_audio(&self, fragment: Bytes) {
        self.buffer.append(fragment);
    }

    /// Claim the session for one turn and take the buffered utterance.
    ///
    /// Runs synchronously so that audio received after the stop signal is
    /// never part of this turn. Returns `Busy` when a turn is already running
    /// (the buffer is left alone) and `Empty` when nothing was buffered.
    pub fn begin_turn(self: &Arc<Self>) -> Result<PendingTurn, TurnOutcome> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(
                connection_id = %self.id,
                state = ?self.state(),
                buffered_bytes = self.buffer.buffered_bytes(),
                "stop received while a turn is running, dropping it"
            );
            return Err(TurnOutcome::Busy);
        }

        let turn = PendingTurn {
            session: Arc::clone(self),
            turn_id: TurnId::new(),
            pcm: self.buffer.drain_all(),
        };
        if turn.pcm.is_empty() {
            debug!(connection_id = %self.id, "stop received with empty buffer");
            return Err(TurnOutcome::Empty);
        }

        let _ = self.turns.fetch_add(1, Ordering::Relaxed);
        info!(
            connection_id = %self.id,
            turn_id = %turn.turn_id,
            bytes = turn.pcm.len(),
            duration_ms = audio::pcm_duration_ms(turn.pcm.len()),
            "handling stop event"
        );
        Ok(turn)
    }

    /// Handle the client's "utterance complete" signal end to end.
    pub async fn handle_stop(self: &Arc<Self>) -> TurnOutcome {
        match self.begin_turn() {
            Ok(turn) => turn.run().await,
            Err(outcome) => outcome,
        }
    }

    /// Report a client-facing error without touching the buffer or the turn.
    pub async fn send_error(&self, error: &AppError) -> bool {
        match serde_json::to_string(&error.envelope()) {
            Ok(json) => self.send_json(json, "error").await,
            Err(e) => {
                tracing::error!(connection_id = %self.id, error = %e, "failed to serialize error envelope");
                false
            }
        }
    }

    fn set_state(&self, next: TurnState) {
        let mut state = self.state.lock();
        if *state != next {
            debug!(connection_id = %self.id, from = ?*state, to = ?next, "turn state");
            *state = next;
        }
    }

    async fn run_turn(&self, pcm: Bytes) -> TurnOutcome {
        // ── Transcribe ──────────────────────────────────────────────
        self.set_state(TurnState::Transcribing);
        self.emit(OutboundMessage::status(StatusEvent::TranscriptionStart)).await;

        let transcript = match self.stages.transcriber.transcribe(pcm).await {
            Ok(text) => text,
            Err(e) => {
                warn!(connection_id = %self.id, kind = e.error_kind(), error = %e, "transcription failed");
                let marker = if e.is_rate_limited() {
                    markers::TRANSCRIPTION_RATE_LIMITED
                } else {
                    markers::TRANSCRIPTION_FAILED
                };
                self.emit(OutboundMessage::ai(marker)).await;
                return TurnOutcome::TranscriptionFailed(e);
            }
        };
        info!(connection_id = %self.id, transcript = %transcript, "transcription complete");

        // ── Respond ─────────────────────────────────────────────────
        self.set_state(TurnState::Responding);
        self.emit(OutboundMessage::status(StatusEvent::GetAgentResponseStart)).await;

        let reply = match self.stages.responder.respond(&transcript).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(connection_id = %self.id, kind = e.error_kind(), error = %e, "agent response failed");
                let marker = if e.is_rate_limited() {
                    markers::AGENT_RATE_LIMITED
                } else {
                    markers::AGENT_PROVIDER_FAILED
                };
                self.emit(OutboundMessage::user(transcript)).await;
                self.emit(OutboundMessage::ai(marker)).await;
                return TurnOutcome::ResponseFailed(e);
            }
        };
        info!(
            connection_id = %self.id,
            reply = %reply.text,
            directed = reply.is_directed_at_agent,
            "agent response"
        );

        if !reply.should_speak() {
            self.set_state(TurnState::Skipped);
            self.emit(OutboundMessage::ai(markers::NOT_DIRECTED)).await;
            return TurnOutcome::Ignored;
        }

        // ── Synthesize ──────────────────────────────────────────────
        self.set_state(TurnState::Synthesizing);
        self.emit(OutboundMessage::status(StatusEvent::TtsStart)).await;

        let audio = match self.stages.synthesizer.synthesize(&reply.text).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(connection_id = %self.id, kind = e.error_kind(), error = %e, "speech synthesis failed");
                self.emit(OutboundMessage::ai(markers::TTS_FAILED)).await;
                return TurnOutcome::SynthesisFailed(e);
            }
        };
        info!(connection_id = %self.id, bytes = audio.len(), "sending audio");

        // The three payloads have no relative order; each failure is logged on its own.
        let _ = tokio::join!(
            self.send_audio(audio.clone()),
            self.emit(OutboundMessage::user(transcript.clone())),
            self.emit(OutboundMessage::ai(reply.text.clone())),
        );

        TurnOutcome::Completed(TurnResult {
            transcribed_text: transcript,
            agent_reply_text: reply.text,
            is_directed_at_agent: reply.is_directed_at_agent,
            synthesized_audio: Some(audio),
        })
    }

    async fn emit(&self, message: OutboundMessage) -> bool {
        match serde_json::to_string(&message) {
            Ok(json) => self.send_json(json, message_kind(&message)).await,
            Err(e) => {
                tracing::error!(connection_id = %self.id, error = %e, "failed to serialize outbound message");
                false
            }
        }
    }

    async fn send_json(&self, json: String, kind: &'static str) -> bool {
        match self.transport.send_text(json).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(connection_id = %self.id, kind, error = %e, "websocket send failed");
                false
            }
        }
    }

    async fn send_audio(&self, audio: Bytes) -> bool {
        match self.transport.send_binary(audio).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(connection_id = %self.id, kind = "audio", error = %e, "websocket send failed");
                false
            }
        }
    }
}

fn message_kind(message: &OutboundMessage) -> &'static str {
    match message {
        OutboundMessage::Event { .. } => "event",
        OutboundMessage::Text { .. } => "text",
    }
}

fn outcome_kind(outcome: &TurnOutcome) -> &'static str {
    match outcome {
        TurnOutcome::Empty => "empty",
        TurnOutcome::Busy => "busy",
        TurnOutcome::TranscriptionFailed(_) => "transcription_failed",
        TurnOutcome::ResponseFailed(_) => "response_failed",
        TurnOutcome::Ignored => "ignored",
        TurnOutcome::SynthesisFailed(_) => "synthesis_failed",
        TurnOutcome::Completed(_) => "completed",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    use sawt_core::stages::AgentReply;
    use sawt_providers::mock::{MockResponder, MockResponse, MockSynthesizer, MockTranscriber};

    use super::*;
    use crate::transport::{ChannelTransport, Outbound};

    struct Harness {
        session: Arc<Session>,
        rx: mpsc::Receiver<Outbound>,
        transcriber: Arc<MockTranscriber>,
        responder: Arc<MockResponder>,
        synthesizer: Arc<MockSynthesizer>,
    }

    impl Harness {
        fn new(
            transcriber: MockTranscriber,
            responder: MockResponder,
            synthesizer: MockSynthesizer,
        ) -> Self {
            let (transport, rx) = ChannelTransport::channel(64);
            let transcriber = Arc::new(transcriber);
            let responder = Arc::new(responder);
            let synthesizer = Arc::new(synthesizer);
            let stages = Stages {
                transcriber: transcriber.clone(),
                responder: responder.clone(),
                synthesizer: synthesizer.clone(),
            };
            let session = Arc::new(Session::new(
                ConnectionId::new(),
                Arc::new(transport),
                stages,
            ));
            Self {
                session,
                rx,
                transcriber,
                responder,
                synthesizer,
            }
        }

        fn happy(transcript: &str, reply: &str) -> Self {
            Self::new(
                MockTranscriber::text(transcript),
                MockResponder::reply(reply, true),
                MockSynthesizer::audio(b"ID3-audio"),
            )
        }

        fn drain(&mut self) -> Vec<Outbound> {
            let mut frames = Vec::new();
            while let Ok(frame) = self.rx.try_recv() {
                frames.push(frame);
            }
            frames
        }

        fn drain_json(&mut self) -> Vec<Value> {
            self.drain()
                .into_iter()
                .filter_map(|frame| match frame {
                    Outbound::Text(text) => serde_json::from_str(&text).ok(),
                    _ => None,
                })
                .collect()
        }
    }

    fn event(name: &str) -> Value {
        json!({"type": "event", "event": name})
    }

    fn text(role: &str, text: &str) -> Value {
        json!({"type": "text", "role": role, "text": text})
    }

    #[tokio::test]
    async fn stop_with_empty_buffer_sends_nothing() {
        let mut h = Harness::happy("hi", "hello there");
        assert_eq!(h.session.handle_stop().await, TurnOutcome::Empty);
        assert!(h.drain().is_empty());
        assert_eq!(h.transcriber.call_count(), 0);
        assert_eq!(h.session.turns_started(), 0);
    }

    #[tokio::test]
    async fn transcriber_receives_concatenated_audio() {
        let h = Harness::happy("hi", "hello there");
        h.session.append_audio(Bytes::from_static(b"\x01\x02"));
        h.session.append_audio(Bytes::from_static(b"\x03\x04"));

        let _ = h.session.handle_stop().await;
        assert_eq!(h.transcriber.inputs(), vec![Bytes::from_static(b"\x01\x02\x03\x04")]);
        assert_eq!(h.session.buffered_bytes(), 0);
    }

    #[tokio::test]
    async fn transcription_rate_limit_stops_the_turn() {
        let mut h = Harness::new(
            MockTranscriber::new(vec![MockResponse::rate_limited()]),
            MockResponder::reply("unused", true),
            MockSynthesizer::audio(b"unused"),
        );
        h.session.append_audio(Bytes::from_static(b"\x00\x00"));

        let outcome = h.session.handle_stop().await;
        assert!(matches!(outcome, TurnOutcome::TranscriptionFailed(StageError::RateLimited(_))));
        assert_eq!(
            h.drain_json(),
            vec![
                event("transcription_start"),
                text("ai", markers::TRANSCRIPTION_RATE_LIMITED),
            ]
        );
        assert_eq!(h.responder.call_count(), 0);
    }

    #[tokio::test]
    async fn transcription_provider_error_uses_generic_marker() {
        let mut h = Harness::new(
            MockTranscriber::new(vec![MockResponse::provider_error()]),
            MockResponder::reply("unused", true),
            MockSynthesizer::audio(b"unused"),
        );
        h.session.append_audio(Bytes::from_static(b"\x00\x00"));

        let _ = h.session.handle_stop().await;
        assert_eq!(
            h.drain_json(),
            vec![event("transcription_start"), text("ai", markers::TRANSCRIPTION_FAILED)]
        );
    }

    #[tokio::test]
    async fn agent_rate_limit_echoes_transcript_then_marker() {
        let mut h = Harness::new(
            MockTranscriber::text("what time is it"),
            MockResponder::new(vec![MockResponse::rate_limited()]),
            MockSynthesizer::audio(b"unused"),
        );
        h.session.append_audio(Bytes::from_static(b"\x00\x00"));

        let outcome = h.session.handle_stop().await;
        assert!(matches!(outcome, TurnOutcome::ResponseFailed(_)));
        assert_eq!(
            h.drain_json(),
            vec![
                event("transcription_start"),
                event("get_agent_response_start"),
                text("user", "what time is it"),
                text("ai", markers::AGENT_RATE_LIMITED),
            ]
        );
        assert_eq!(h.synthesizer.call_count(), 0);
    }

    #[tokio::test]
    async fn agent_provider_error_echoes_transcript_then_marker() {
        let mut h = Harness::new(
            MockTranscriber::text("hello"),
            MockResponder::new(vec![MockResponse::provider_error()]),
            MockSynthesizer::audio(b"unused"),
        );
        h.session.append_audio(Bytes::from_static(b"\x00\x00"));

        let _ = h.session.handle_stop().await;
        let frames = h.drain_json();
        assert_eq!(
            &frames[2..],
            &[text("user", "hello"), text("ai", markers::AGENT_PROVIDER_FAILED)]
        );
    }

    #[tokio::test]
    async fn undirected_reply_is_ignored() {
        let mut h = Harness::new(
            MockTranscriber::text("hello"),
            MockResponder::reply("", false),
            MockSynthesizer::audio(b"unused"),
        );
        h.session.append_audio(Bytes::from_static(b"\x00\x00"));

        assert_eq!(h.session.handle_stop().await, TurnOutcome::Ignored);
        let frames = h.drain();
        assert!(frames.iter().all(|f| matches!(f, Outbound::Text(_))));
        let json: Vec<Value> = frames
            .iter()
            .filter_map(|f| match f {
                Outbound::Text(t) => serde_json::from_str(t).ok(),
                _ => None,
            })
            .collect();
        assert_eq!(
            json,
            vec![
                event("transcription_start"),
                event("get_agent_response_start"),
                text("ai", markers::NOT_DIRECTED),
            ]
        );
        assert_eq!(h.synthesizer.call_count(), 0);
    }

    #[tokio::test]
    async fn directed_but_empty_reply_is_ignored() {
        let mut h = Harness::new(
            MockTranscriber::text("hello"),
            MockResponder::reply("", true),
            MockSynthesizer::audio(b"unused"),
        );
        h.session.append_audio(Bytes::from_static(b"\x00\x00"));

        assert_eq!(h.session.handle_stop().await, TurnOutcome::Ignored);
        assert_eq!(h.drain_json().last(), Some(&text("ai", markers::NOT_DIRECTED)));
    }

    #[tokio::test]
    async fn tts_failure_sends_only_the_marker() {
        let mut h = Harness::new(
            MockTranscriber::text("hi"),
            MockResponder::reply("hello there", true),
            MockSynthesizer::new(vec![MockResponse::provider_error()]),
        );
        h.session.append_audio(Bytes::from_static(b"\x00\x00"));

        let outcome = h.session.handle_stop().await;
        assert!(matches!(outcome, TurnOutcome::SynthesisFailed(_)));
        assert_eq!(
            h.drain_json(),
            vec![
                event("transcription_start"),
                event("get_agent_response_start"),
                event("tts_start"),
                text("ai", markers::TTS_FAILED),
            ]
        );
    }

    #[tokio::test]
    async fn full_turn_emits_audio_and_both_texts_after_tts_start() {
        let mut h = Harness::happy("hi", "hello there");
        h.session.append_audio(Bytes::from_static(b"\x01\x02"));

        let outcome = h.session.handle_stop().await;
        let TurnOutcome::Completed(result) = outcome else {
            panic!("expected completed turn, got {outcome:?}");
        };
        assert_eq!(result.transcribed_text, "hi");
        assert_eq!(result.agent_reply_text, "hello there");
        assert!(result.is_directed_at_agent);
        assert_eq!(result.synthesized_audio, Some(Bytes::from_static(b"ID3-audio")));
        assert_eq!(h.synthesizer.inputs(), vec!["hello there".to_string()]);

        let frames = h.drain();
        assert_eq!(frames.len(), 6);
        let head: Vec<Value> = frames[..3]
            .iter()
            .filter_map(|f| match f {
                Outbound::Text(t) => serde_json::from_str(t).ok(),
                _ => None,
            })
            .collect();
        assert_eq!(
            head,
            vec![
                event("transcription_start"),
                event("get_agent_response_start"),
                event("tts_start"),
            ]
        );

        let tail = &frames[3..];
        assert!(tail.contains(&Outbound::Binary(Bytes::from_static(b"ID3-audio"))));
        let texts: Vec<Value> = tail
            .iter()
            .filter_map(|f| match f {
                Outbound::Text(t) => serde_json::from_str(t).ok(),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 2);
        assert!(texts.contains(&text("user", "hi")));
        assert!(texts.contains(&text("ai", "hello there")));
    }

    #[tokio::test]
    async fn session_returns_to_idle_and_accepts_next_turn() {
        let mut h = Harness::new(
            MockTranscriber::new(vec![
                MockResponse::provider_error(),
                MockResponse::Ok("second".into()),
            ]),
            MockResponder::reply("ok", true),
            MockSynthesizer::audio(b"a"),
        );

        h.session.append_audio(Bytes::from_static(b"\x00\x00"));
        let _ = h.session.handle_stop().await;
        assert_eq!(h.session.state(), TurnState::Idle);
        assert!(!h.session.busy.load(Ordering::Acquire));
        let _ = h.drain();

        h.session.append_audio(Bytes::from_static(b"\x01\x01"));
        let outcome = h.session.handle_stop().await;
        assert!(matches!(outcome, TurnOutcome::Completed(_)));
        assert_eq!(h.session.turns_started(), 2);
    }

    #[tokio::test]
    async fn send_failures_are_swallowed() {
        let mut h = Harness::happy("hi", "hello there");
        h.session.append_audio(Bytes::from_static(b"\x00\x00"));
        let rx = std::mem::replace(&mut h.rx, mpsc::channel(1).1);
        drop(rx);

        let outcome = h.session.handle_stop().await;
        assert!(matches!(outcome, TurnOutcome::Completed(_)));
        assert_eq!(h.session.state(), TurnState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_busy_is_dropped_and_audio_kept() {
        let h = Harness::new(
            MockTranscriber::new(vec![
                MockResponse::delayed(Duration::from_secs(5), MockResponse::Ok("slow".into())),
                MockResponse::Ok("next".into()),
            ]),
            MockResponder::new(vec![
                MockResponse::Ok(AgentReply::new("", false)),
                MockResponse::Ok(AgentReply::new("", false)),
            ]),
            MockSynthesizer::audio(b"unused"),
        );
        h.session.append_audio(Bytes::from_static(b"\x01\x01"));

        let session = Arc::clone(&h.session);
        let first = tokio::spawn(async move { session.handle_stop().await });
        while h.session.state() != TurnState::Transcribing {
            tokio::task::yield_now().await;
        }

        // Audio keeps buffering into a fresh utterance during the turn.
        h.session.append_audio(Bytes::from_static(b"\x02\x02"));
        assert_eq!(h.session.handle_stop().await, TurnOutcome::Busy);
        assert_eq!(h.session.buffered_bytes(), 2);

        assert_eq!(first.await.unwrap(), TurnOutcome::Ignored);
        assert_eq!(h.session.handle_stop().await, TurnOutcome::Ignored);
        assert_eq!(
            h.transcriber.inputs(),
            vec![Bytes::from_static(b"\x01\x01"), Bytes::from_static(b"\x02\x02")]
        );
    }

    #[tokio::test]
    async fn begin_turn_takes_only_audio_received_before_it() {
        let h = Harness::new(
            MockTranscriber::text("first"),
            MockResponder::reply("", false),
            MockSynthesizer::audio(b"unused"),
        );
        h.session.append_audio(Bytes::from_static(b"\x01\x02"));

        let turn = h.session.begin_turn().unwrap();
        assert!(h.session.busy.load(Ordering::Acquire));
        h.session.append_audio(Bytes::from_static(b"\x09\x09"));

        assert_eq!(turn.run().await, TurnOutcome::Ignored);
        assert!(!h.session.busy.load(Ordering::Acquire));
        assert_eq!(h.transcriber.inputs(), vec![Bytes::from_static(b"\x01\x02")]);
        assert_eq!(h.session.buffered_bytes(), 2);
    }

    #[tokio::test]
    async fn dropping_a_claimed_turn_releases_the_session() {
        let h = Harness::happy("hi", "hello");
        h.session.append_audio(Bytes::from_static(b"\x01\x02"));

        let turn = h.session.begin_turn().unwrap();
        assert_eq!(h.session.begin_turn().err(), Some(TurnOutcome::Busy));
        drop(turn);

        assert!(!h.session.busy.load(Ordering::Acquire));
        assert_eq!(h.session.state(), TurnState::Idle);
        assert_eq!(h.session.begin_turn().err(), Some(TurnOutcome::Empty));
    }

    #[tokio::test]
    async fn send_error_uses_envelope_and_keeps_buffer() {
        let mut h = Harness::happy("hi", "hello");
        h.session.append_audio(Bytes::from_static(b"\x05\x06"));

        assert!(h.session.send_error(&AppError::WebSocket("Invalid JSON: eof".into())).await);
        assert_eq!(
            h.drain_json(),
            vec![json!({"error": {"code": "WEBSOCKET_ERROR", "message": "Invalid JSON: eof", "status": 400}})]
        );
        assert_eq!(h.session.buffered_bytes(), 2);
        assert_eq!(h.responder.call_count(), 0);
    }
}
