use std::sync::atomic::AtomicBool;

use crate::domain::errors::Result;
use crate::domain::value_objects::{Frame, SourceLocator};

/// An open decoder bound to one locator.
pub trait FrameSource: Send {
    /// Pull the next decoded frame.
    ///
    /// `Ok(None)` means no frame is available right now (end of data or a
    /// transient read failure); what happens next is the caller's policy.
    /// Errors are permanent. Implementations that block should return early
    /// once `running` is cleared.
    fn read_frame(&mut self, running: &AtomicBool) -> Result<Option<Frame>>;

    /// Seek back to the first frame.
    fn rewind(&mut self) -> Result<()>;

    /// Tear down the decoder. Called exactly once, after which the source is
    /// never read again.
    fn release(&mut self);
}

/// Port for opening decoders.
pub trait SourceOpener: Send + Sync {
    /// Open a decoder for `locator`. Anything partially acquired must be
    /// released before an error is returned.
    fn open(&self, locator: &SourceLocator) -> Result<Box<dyn FrameSource>>;
}
