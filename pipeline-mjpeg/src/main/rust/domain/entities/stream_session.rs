use std::fmt;
use std::time::Instant;
use uuid::Uuid;

use crate::domain::value_objects::{SourceKind, SourceLocator};

/// Why a session stopped producing chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Viewer went away.
    ConsumerClosed,
    /// Live source ran out of data.
    StreamEnded,
    /// Decoder could not be opened; no chunks were produced.
    SourceUnavailable,
    /// Decoder reported a permanent failure.
    DecoderFailed,
    /// No frame arrived within the read timeout.
    Stalled,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsumerClosed => "consumer_closed",
            Self::StreamEnded => "stream_ended",
            Self::SourceUnavailable => "source_unavailable",
            Self::DecoderFailed => "decoder_failed",
            Self::Stalled => "stalled",
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Opening,
    Streaming,
    Ended(EndReason),
}

/// One viewer's feed: bound to a single locator for its whole life.
#[derive(Debug, Clone)]
pub struct StreamSession {
    id: String,
    locator: SourceLocator,
    started_at: Instant,
    state: SessionState,
    frames_decoded: u64,
    frames_skipped: u64,
    chunks_sent: u64,
    bytes_sent: u64,
    rewinds: u64,
}

impl StreamSession {
    pub fn new(locator: SourceLocator) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            locator,
            started_at: Instant::now(),
            state: SessionState::Opening,
            frames_decoded: 0,
            frames_skipped: 0,
            chunks_sent: 0,
            bytes_sent: 0,
            rewinds: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    /// Classification fixed at construction.
    pub fn kind(&self) -> SourceKind {
        self.locator.kind()
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, SessionState::Ended(_))
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        match self.state {
            SessionState::Ended(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn activate(&mut self) {
        if matches!(self.state, SessionState::Opening) {
            self.state = SessionState::Streaming;
        }
    }

    pub fn record_frame_decoded(&mut self) {
        self.frames_decoded += 1;
    }

    pub fn record_frame_skipped(&mut self) {
        self.frames_skipped += 1;
    }

    pub fn record_chunk_sent(&mut self, bytes: usize) {
        self.chunks_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub fn record_rewind(&mut self) {
        self.rewinds += 1;
    }

    /// First reason wins; later calls are ignored.
    pub fn end(&mut self, reason: EndReason) {
        if !self.is_ended() {
            self.state = SessionState::Ended(reason);
        }
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    pub fn chunks_sent(&self) -> u64 {
        self.chunks_sent
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn rewinds(&self) -> u64 {
        self.rewinds
    }
}
