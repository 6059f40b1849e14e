use async_trait::async_trait;

use crate::domain::entities::Overlay;
use crate::domain::errors::Result;
use crate::domain::value_objects::{OverlayId, OverlayPayload};

/// Port for the overlay document backend.
#[async_trait]
pub trait OverlayStore: Send + Sync {
    /// Persist a new document; the store assigns its identifier.
    async fn create(&self, payload: OverlayPayload) -> Result<OverlayId>;

    /// All documents in creation order.
    async fn list(&self) -> Result<Vec<Overlay>>;

    /// Merge `patch` into an existing document (last write wins).
    /// `DomainError::OverlayNotFound` if there is no such document.
    async fn update(&self, id: OverlayId, patch: OverlayPayload) -> Result<()>;

    /// Remove a document, returning whether it existed.
    async fn delete(&self, id: OverlayId) -> Result<bool>;

    /// Cheap reachability check for readiness probes.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
