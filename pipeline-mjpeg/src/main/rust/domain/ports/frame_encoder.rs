use crate::domain::errors::Result;
use crate::domain::value_objects::Frame;

/// Port for compressing a decoded frame into a still image.
pub trait FrameEncoder: Send + Sync {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>>;
}
