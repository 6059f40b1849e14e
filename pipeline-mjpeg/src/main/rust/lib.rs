pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{FeedStream, OverlayService, StreamingService};
pub use config::Config;
pub use domain::entities::{EndReason, Overlay, SessionState, StreamSession};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{FrameEncoder, FrameSource, MetricsReporter, OverlayStore, SourceOpener};
pub use domain::value_objects::{
    EncodedChunk, Frame, OverlayId, ServerConfig, SourceKind, SourceLocator, StreamConfig,
};
pub use infrastructure::encoding::JpegFrameEncoder;
pub use infrastructure::gstreamer::{GStreamerSourceOpener, PipelineBuilder};
pub use infrastructure::http::routes;
pub use infrastructure::metrics::PrometheusReporter;
pub use infrastructure::store::{InMemoryOverlayStore, SqliteOverlayStore};
