use crate::domain::errors::Result;
use crate::domain::value_objects::EncodedChunk;

/// Where a session hands its chunks. Sending may block until the consumer
/// drains earlier chunks.
pub trait ChunkSink: Send {
    /// `DomainError::ConsumerGone` once nobody is reading any more.
    fn send(&mut self, chunk: EncodedChunk) -> Result<()>;

    fn is_closed(&self) -> bool;
}
