use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::Overlay;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::OverlayStore;
use crate::domain::value_objects::{OverlayId, OverlayPayload};

/// Process-local overlay store, kept in creation order.
#[derive(Default)]
pub struct InMemoryOverlayStore {
    overlays: RwLock<Vec<Overlay>>,
}

impl InMemoryOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OverlayStore for InMemoryOverlayStore {
    async fn create(&self, payload: OverlayPayload) -> Result<OverlayId> {
        let id = OverlayId::generate();
        self.overlays.write().await.push(Overlay::new(id, payload));
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<Overlay>> {
        Ok(self.overlays.read().await.clone())
    }

    async fn update(&self, id: OverlayId, patch: OverlayPayload) -> Result<()> {
        let mut overlays = self.overlays.write().await;
        let overlay = overlays
            .iter_mut()
            .find(|overlay| overlay.id() == id)
            .ok_or_else(|| DomainError::OverlayNotFound(id.to_string()))?;
        overlay.payload_mut().merge(patch);
        Ok(())
    }

    async fn delete(&self, id: OverlayId) -> Result<bool> {
        let mut overlays = self.overlays.write().await;
        let before = overlays.len();
        overlays.retain(|overlay| overlay.id() != id);
        Ok(overlays.len() != before)
    }
}
