mod encoded_chunk;
mod frame;
mod overlay_id;
mod overlay_payload;
mod server_config;
mod source_locator;
mod stream_config;

pub use encoded_chunk::{EncodedChunk, BOUNDARY, FEED_CONTENT_TYPE};
pub use frame::{Frame, RGB_BYTES_PER_PIXEL};
pub use overlay_id::OverlayId;
pub use overlay_payload::{OverlayPayload, RESERVED_ID_FIELDS};
pub use server_config::ServerConfig;
pub use source_locator::{SourceKind, SourceLocator};
pub use stream_config::{StreamConfig, DEFAULT_FALLBACK_URL};
