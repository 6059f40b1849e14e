use serde_json::{Map, Value};

use crate::domain::value_objects::{OverlayId, OverlayPayload};

/// A stored overlay: identity plus opaque attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    id: OverlayId,
    payload: OverlayPayload,
}

impl Overlay {
    pub fn new(id: OverlayId, payload: OverlayPayload) -> Self {
        Self { id, payload }
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn payload(&self) -> &OverlayPayload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut OverlayPayload {
        &mut self.payload
    }

    /// Wire shape: the payload fields plus `"id"` as a plain string.
    pub fn to_document(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(self.id.to_string()));
        fields.extend(self.payload.clone().into_fields());
        Value::Object(fields)
    }
}
