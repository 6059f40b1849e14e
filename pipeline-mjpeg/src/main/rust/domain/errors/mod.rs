use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid port: port cannot be zero")]
    InvalidPort,

    #[error("Port {0} requires root privileges")]
    PortRequiresRoot(u16),

    #[error("Invalid JPEG quality {0}: must be between 1 and 100")]
    InvalidJpegQuality(u8),

    #[error("Chunk buffer must hold at least one chunk")]
    InvalidChunkBuffer,

    #[error("Timeout cannot be zero: {0}")]
    InvalidTimeout(&'static str),

    #[error("Fallback source locator cannot be empty")]
    EmptyFallbackLocator,

    #[error("Source unavailable: {locator} ({reason})")]
    SourceUnavailable { locator: String, reason: String },

    #[error("Decoder failed: {0}")]
    DecoderFailed(String),

    #[error("Source stalled: no frame within {0:?}")]
    SourceStalled(Duration),

    #[error("Frame encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Consumer disconnected")]
    ConsumerGone,

    #[error("Server is shutting down")]
    ShuttingDown,

    #[error("Overlay not found: {0}")]
    OverlayNotFound(String),

    #[error("Malformed overlay identifier: {0}")]
    MalformedIdentifier(String),

    #[error("Invalid overlay payload: {0}")]
    InvalidPayload(String),

    #[error("Overlay store failure: {0}")]
    StoreFailed(String),
}

impl DomainError {
    pub fn source_unavailable(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
