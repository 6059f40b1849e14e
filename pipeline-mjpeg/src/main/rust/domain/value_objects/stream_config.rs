use std::time::Duration;

use super::SourceLocator;
use crate::domain::errors::{DomainError, Result};

/// Sample clip served when a viewer does not name a source.
pub const DEFAULT_FALLBACK_URL: &str =
    "https://raw.githubusercontent.com/intel-iot-devkit/sample-videos/master/person-bicycle-car-detection.mp4";

#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    fallback: SourceLocator,
    open_timeout: Duration,
    read_timeout: Duration,
    jpeg_quality: u8,
    chunk_buffer: usize,
}

impl StreamConfig {
    pub fn new(fallback: SourceLocator) -> Result<Self> {
        if fallback.is_empty() {
            return Err(DomainError::EmptyFallbackLocator);
        }

        Ok(Self {
            fallback,
            open_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(15),
            jpeg_quality: 80,
            chunk_buffer: 2,
        })
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_chunk_buffer(mut self, chunks: usize) -> Self {
        self.chunk_buffer = chunks;
        self
    }

    pub fn fallback(&self) -> &SourceLocator {
        &self.fallback
    }

    pub fn open_timeout(&self) -> Duration {
        self.open_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn chunk_buffer(&self) -> usize {
        self.chunk_buffer
    }

    /// Pure validation logic (domain concern)
    pub fn validate(&self) -> Result<()> {
        if self.open_timeout.is_zero() {
            return Err(DomainError::InvalidTimeout("open timeout"));
        }

        if self.read_timeout.is_zero() {
            return Err(DomainError::InvalidTimeout("read timeout"));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(DomainError::InvalidJpegQuality(self.jpeg_quality));
        }

        if self.chunk_buffer == 0 {
            return Err(DomainError::InvalidChunkBuffer);
        }

        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            fallback: SourceLocator::new(DEFAULT_FALLBACK_URL),
            open_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(15),
            jpeg_quality: 80,
            chunk_buffer: 2,
        }
    }
}
