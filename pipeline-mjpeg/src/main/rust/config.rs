use std::time::Duration;

use clap::Parser;

use crate::domain::errors::Result;
use crate::domain::value_objects::{
    ServerConfig, SourceLocator, StreamConfig, DEFAULT_FALLBACK_URL,
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pipeline-mjpeg",
    version = "0.1.0",
    author = "Hawkeye Video Pipeline",
    about = "MJPEG-over-HTTP feed server with overlay storage"
)]
pub struct Config {
    /// HTTP port serving the feed, overlays, metrics and health probes
    #[arg(long, env = "HTTP_PORT", default_value = "5000")]
    pub http_port: u16,

    /// Source streamed when a request carries no `url`
    #[arg(long, env = "FALLBACK_SOURCE_URL", default_value = DEFAULT_FALLBACK_URL)]
    pub fallback_url: String,

    /// Seconds to wait for a source to start playing
    #[arg(long, env = "SOURCE_OPEN_TIMEOUT_SECS", default_value = "10")]
    pub open_timeout_secs: u64,

    /// Seconds without a decoded frame before a session is ended
    #[arg(long, env = "SOURCE_READ_TIMEOUT_SECS", default_value = "15")]
    pub read_timeout_secs: u64,

    /// JPEG quality (1-100)
    #[arg(long, env = "JPEG_QUALITY", default_value = "80")]
    pub jpeg_quality: u8,

    /// Encoded chunks buffered per viewer before decoding pauses
    #[arg(long, env = "CHUNK_BUFFER", default_value = "2")]
    pub chunk_buffer: usize,

    /// SQLite database for overlays (in-memory store when unset)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        Self::validate_port(self.http_port, "HTTP")?;

        if self.fallback_url.trim().is_empty() {
            anyhow::bail!("Fallback source URL cannot be empty");
        }

        if self.open_timeout_secs == 0 {
            anyhow::bail!("Source open timeout cannot be 0");
        }

        if self.read_timeout_secs == 0 {
            anyhow::bail!("Source read timeout cannot be 0");
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            anyhow::bail!(
                "Invalid JPEG quality: {}. Must be between 1 and 100",
                self.jpeg_quality
            );
        }

        if self.chunk_buffer == 0 {
            anyhow::bail!("Chunk buffer must hold at least one chunk");
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("sqlite:") {
                anyhow::bail!("Database URL must start with sqlite: ({})", url);
            }
        }

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        if port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid {} port: {} is a privileged port (< {}). Use a port >= {}",
                name,
                port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }
        Ok(())
    }

    pub fn to_server_config(&self) -> Result<ServerConfig> {
        ServerConfig::new(self.http_port)
    }

    pub fn to_stream_config(&self) -> Result<StreamConfig> {
        let config = StreamConfig::new(SourceLocator::new(&self.fallback_url))?
            .with_open_timeout(Duration::from_secs(self.open_timeout_secs))
            .with_read_timeout(Duration::from_secs(self.read_timeout_secs))
            .with_jpeg_quality(self.jpeg_quality)
            .with_chunk_buffer(self.chunk_buffer);
        config.validate()?;
        Ok(config)
    }
}
