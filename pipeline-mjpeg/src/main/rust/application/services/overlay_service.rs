use std::sync::Arc;

use serde_json::Value;

use crate::domain::errors::Result;
use crate::domain::ports::OverlayStore;
use crate::domain::value_objects::{OverlayId, OverlayPayload};

/// Gateway between the HTTP layer and the overlay document store.
///
/// Identifier fields in client bodies are always discarded; identifiers in
/// paths must parse before the store is touched.
pub struct OverlayService {
    store: Arc<dyn OverlayStore>,
}

impl OverlayService {
    pub fn new(store: Arc<dyn OverlayStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, body: Value) -> Result<OverlayId> {
        let payload = OverlayPayload::from_client(body)?;
        let id = self.store.create(payload).await?;
        tracing::info!(overlay_id = %id, "Overlay created");
        Ok(id)
    }

    /// Wire documents in creation order.
    pub async fn list(&self) -> Result<Vec<Value>> {
        let overlays = self.store.list().await?;
        Ok(overlays.iter().map(|overlay| overlay.to_document()).collect())
    }

    pub async fn update(&self, raw_id: &str, body: Value) -> Result<()> {
        let id = OverlayId::parse(raw_id)?;
        let patch = OverlayPayload::from_client(body)?;
        self.store.update(id, patch).await?;
        tracing::info!(overlay_id = %id, "Overlay updated");
        Ok(())
    }

    /// Idempotent: deleting an unknown overlay is not an error.
    pub async fn delete(&self, raw_id: &str) -> Result<()> {
        let id = OverlayId::parse(raw_id)?;
        let existed = self.store.delete(id).await?;
        tracing::info!(overlay_id = %id, existed, "Overlay deleted");
        Ok(())
    }

    pub async fn is_ready(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Overlay store not ready: {}", e);
                false
            }
        }
    }
}
