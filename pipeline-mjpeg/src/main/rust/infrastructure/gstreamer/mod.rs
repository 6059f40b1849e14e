mod gstreamer_source;
mod pipeline_builder;

pub use gstreamer_source::{GStreamerSource, GStreamerSourceOpener};
pub use pipeline_builder::{PipelineBuilder, FRAME_SINK_NAME};
