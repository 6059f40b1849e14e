mod overlay_service;
mod session_runner;
mod source_handle;
mod streaming_service;

pub use overlay_service::OverlayService;
pub use session_runner::SessionRunner;
pub use source_handle::SourceHandle;
pub use streaming_service::{ChannelSink, FeedStream, StreamingService};
