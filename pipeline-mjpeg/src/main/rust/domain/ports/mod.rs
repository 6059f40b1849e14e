mod chunk_sink;
mod frame_encoder;
mod frame_source;
mod metrics_reporter;
mod overlay_store;

pub use chunk_sink::ChunkSink;
pub use frame_encoder::FrameEncoder;
pub use frame_source::{FrameSource, SourceOpener};
pub use metrics_reporter::MetricsReporter;
pub use overlay_store::OverlayStore;
