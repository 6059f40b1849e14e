use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;

use super::{PipelineBuilder, FRAME_SINK_NAME};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{FrameSource, SourceOpener};
use crate::domain::value_objects::{Frame, SourceLocator, StreamConfig, RGB_BYTES_PER_PIXEL};

/// Timeout for a single appsink pull (100ms allows responsive shutdown)
const PULL_SLICE_MS: u64 = 100;

/// Opens one decode pipeline per session.
pub struct GStreamerSourceOpener {
    open_timeout: Duration,
    read_timeout: Duration,
}

impl GStreamerSourceOpener {
    pub fn new(open_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            open_timeout,
            read_timeout,
        }
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.open_timeout(), config.read_timeout())
    }

    fn create_pipeline(launch: &str) -> anyhow::Result<(gstreamer::Pipeline, gst_app::AppSink)> {
        let pipeline = gstreamer::parse::launch(launch)
            .context("Failed to parse pipeline")?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| anyhow::anyhow!("Failed to downcast to Pipeline"))?;

        let appsink = pipeline
            .by_name(FRAME_SINK_NAME)
            .context("Pipeline has no frame sink")?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| anyhow::anyhow!("Frame sink is not an appsink"))?;

        Ok((pipeline, appsink))
    }
}

impl SourceOpener for GStreamerSourceOpener {
    fn open(&self, locator: &SourceLocator) -> Result<Box<dyn FrameSource>> {
        let uri = PipelineBuilder::source_uri(locator)?;
        let launch = PipelineBuilder::build_launch_string(&uri, locator.kind());
        tracing::debug!("Creating pipeline: {}", launch);

        let (pipeline, appsink) = Self::create_pipeline(&launch)
            .map_err(|e| DomainError::source_unavailable(locator.as_str(), format!("{:#}", e)))?;

        let mut source = GStreamerSource {
            pipeline,
            appsink,
            read_timeout: self.read_timeout,
            released: false,
        };

        if let Err(reason) = source.start(self.open_timeout) {
            source.release();
            return Err(DomainError::source_unavailable(locator.as_str(), reason));
        }

        tracing::debug!(locator = %locator, "Pipeline playing");
        Ok(Box::new(source))
    }
}

/// A playing `uridecodebin ! videoconvert ! appsink` pipeline.
pub struct GStreamerSource {
    pipeline: gstreamer::Pipeline,
    appsink: gst_app::AppSink,
    read_timeout: Duration,
    released: bool,
}

impl GStreamerSource {
    fn start(&self, timeout: Duration) -> std::result::Result<(), String> {
        let started = self.pipeline.set_state(gstreamer::State::Playing);

        // Async state changes settle here; a timeout leaves the pipeline
        // prerolling, which is normal for slow network sources.
        let (settled, _, _) = self
            .pipeline
            .state(gstreamer::ClockTime::from_mseconds(timeout.as_millis() as u64));

        if let Some(err) = self.pending_error() {
            return Err(err);
        }

        started.map_err(|e| e.to_string())?;
        settled.map(|_| ()).map_err(|e| e.to_string())
    }

    fn pending_error(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[gstreamer::MessageType::Error])?;

        match msg.view() {
            gstreamer::MessageView::Error(err) => Some(format!(
                "Error from {:?}: {} ({:?})",
                err.src().map(|s| s.path_string()),
                err.error(),
                err.debug()
            )),
            _ => None,
        }
    }

    fn frame_from_sample(sample: &gstreamer::Sample) -> Result<Frame> {
        let caps = sample
            .caps()
            .ok_or_else(|| DomainError::DecoderFailed("Sample without caps".to_string()))?;
        let info = gst_video::VideoInfo::from_caps(caps)
            .map_err(|e| DomainError::DecoderFailed(e.to_string()))?;
        let buffer = sample
            .buffer()
            .ok_or_else(|| DomainError::DecoderFailed("Sample without buffer".to_string()))?;
        let map = buffer
            .map_readable()
            .map_err(|e| DomainError::DecoderFailed(e.to_string()))?;

        let width = info.width();
        let height = info.height();
        let row_len = width as usize * RGB_BYTES_PER_PIXEL;
        // Rows are padded to the stride; strip the padding.
        let stride = (info.stride()[0].max(0) as usize).max(row_len);

        let mut data = Vec::with_capacity(row_len * height as usize);
        for row in map.as_slice().chunks(stride).take(height as usize) {
            data.extend_from_slice(&row[..row_len.min(row.len())]);
        }

        Ok(Frame::new(width, height, data))
    }
}

impl FrameSource for GStreamerSource {
    fn read_frame(&mut self, running: &AtomicBool) -> Result<Option<Frame>> {
        let deadline = Instant::now() + self.read_timeout;
        let slice = gstreamer::ClockTime::from_mseconds(PULL_SLICE_MS);

        loop {
            if !running.load(Ordering::SeqCst) {
                return Ok(None);
            }

            if let Some(sample) = self.appsink.try_pull_sample(slice) {
                return Self::frame_from_sample(&sample).map(Some);
            }

            if self.appsink.is_eos() {
                return Ok(None);
            }

            if let Some(err) = self.pending_error() {
                return Err(DomainError::DecoderFailed(err));
            }

            if Instant::now() >= deadline {
                return Err(DomainError::SourceStalled(self.read_timeout));
            }
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.pipeline
            .seek_simple(
                gstreamer::SeekFlags::FLUSH | gstreamer::SeekFlags::KEY_UNIT,
                gstreamer::ClockTime::ZERO,
            )
            .map_err(|e| DomainError::DecoderFailed(format!("Seek failed: {}", e)))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            tracing::warn!("Failed to stop pipeline: {}", e);
        }
        tracing::debug!("Pipeline released");
    }
}

impl Drop for GStreamerSource {
    fn drop(&mut self) {
        self.release();
    }
}
