use std::sync::atomic::AtomicBool;

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::FrameSource;
use crate::domain::value_objects::Frame;

/// Scoped ownership of an open decoder.
///
/// The decoder is released exactly once: by an explicit [`SourceHandle::release`]
/// or, on any other exit path (early return, panic unwind), when the handle drops.
pub struct SourceHandle {
    source: Option<Box<dyn FrameSource>>,
}

impl SourceHandle {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn read_frame(&mut self, running: &AtomicBool) -> Result<Option<Frame>> {
        self.source_mut()?.read_frame(running)
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.source_mut()?.rewind()
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn source_mut(&mut self) -> Result<&mut Box<dyn FrameSource>> {
        self.source
            .as_mut()
            .ok_or_else(|| DomainError::DecoderFailed("decoder already released".to_string()))
    }

    fn release_inner(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
        }
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}
