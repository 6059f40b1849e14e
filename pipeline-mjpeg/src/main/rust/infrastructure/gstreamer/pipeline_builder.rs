use std::path::Path;

use crate::domain::errors::{DomainError, Result};
use crate::domain::value_objects::{SourceKind, SourceLocator};

/// Name of the appsink element frames are pulled from.
pub const FRAME_SINK_NAME: &str = "frames";

/// Samples the appsink may queue before it blocks the decoder.
const SINK_MAX_BUFFERS: u32 = 2;

pub struct PipelineBuilder;

impl PipelineBuilder {
    /// Convert a locator into a decode-to-RGB pipeline string
    pub fn build_launch_string(uri: &str, kind: SourceKind) -> String {
        format!(
            "uridecodebin uri=\"{}\" ! videoconvert ! video/x-raw,format=RGB ! \
             appsink name={} sync={} max-buffers={} drop=false",
            uri.replace('"', "%22"),
            FRAME_SINK_NAME,
            Self::sync_for_kind(kind),
            SINK_MAX_BUFFERS
        )
    }

    /// URI-shaped locators pass through; anything else is a local path.
    pub fn source_uri(locator: &SourceLocator) -> Result<String> {
        if locator.scheme().is_some() {
            return Ok(locator.as_str().to_string());
        }

        let path = Path::new(locator.as_str());
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| DomainError::source_unavailable(locator.as_str(), e))?
                .join(path)
        };

        glib::filename_to_uri(&absolute, None)
            .map(|uri| uri.to_string())
            .map_err(|e| DomainError::source_unavailable(locator.as_str(), e))
    }

    // Files play at their own frame rate; live feeds already arrive in real time.
    fn sync_for_kind(kind: SourceKind) -> bool {
        match kind {
            SourceKind::Finite => true,
            SourceKind::Live => false,
        }
    }
}
