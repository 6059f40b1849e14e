use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::FrameEncoder;
use crate::domain::value_objects::Frame;

/// Baseline JPEG at a fixed quality.
pub struct JpegFrameEncoder {
    quality: u8,
}

impl JpegFrameEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegFrameEncoder {
    fn default() -> Self {
        Self::new(80)
    }
}

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        // The encoder panics on a size mismatch, so reject those up front.
        if !frame.is_well_formed() {
            return Err(DomainError::EncodeFailed(format!(
                "{}x{} frame carries {} bytes, expected {}",
                frame.width(),
                frame.height(),
                frame.data().len(),
                frame.expected_len()
            )));
        }

        let mut out = Vec::with_capacity(frame.data().len() / 8);
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .write_image(
                frame.data(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| DomainError::EncodeFailed(e.to_string()))?;

        Ok(out)
    }
}
