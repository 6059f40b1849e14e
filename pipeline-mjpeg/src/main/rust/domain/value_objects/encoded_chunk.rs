/// Multipart boundary token; must match the response content-type parameter.
pub const BOUNDARY: &str = "frame";

/// Content type advertised on the feed response.
pub const FEED_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
const PART_TRAILER: &[u8] = b"\r\n";

/// One multipart part carrying a single JPEG image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    bytes: Vec<u8>,
}

impl EncodedChunk {
    /// Wrap JPEG bytes in the part header and trailing delimiter.
    pub fn wrap(jpeg: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(PART_HEADER.len() + jpeg.len() + PART_TRAILER.len());
        bytes.extend_from_slice(PART_HEADER);
        bytes.extend_from_slice(jpeg);
        bytes.extend_from_slice(PART_TRAILER);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The image bytes between header and trailer.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[PART_HEADER.len()..self.bytes.len() - PART_TRAILER.len()]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
