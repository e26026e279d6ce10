use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::models::{ActorId, EventKind, EventPayload};
use crate::error::RelayError;

/// Envelope as it crosses a transport: the payload is still untyped JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    pub kind: EventKind,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A decoded, immutable event record.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    payload: EventPayload,
    origin_id: Option<ActorId>,
    created_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new(payload: impl Into<EventPayload>, origin_id: Option<ActorId>) -> Self {
        Envelope {
            payload: payload.into(),
            origin_id,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn into_payload(self) -> EventPayload {
        self.payload
    }

    pub fn origin_id(&self) -> Option<&ActorId> {
        self.origin_id.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True when `viewer` produced this event, either as the stamped origin or
    /// as the actor named inside the payload.
    pub fn originated_from(&self, viewer: &ActorId) -> bool {
        if let Some(origin) = &self.origin_id {
            if origin == viewer {
                return true;
            }
        }
        self.payload.actor().is_some_and(|actor| viewer.matches(actor))
    }

    pub fn to_wire(&self) -> Result<WireEnvelope, RelayError> {
        Ok(WireEnvelope {
            kind: self.kind(),
            payload: self.payload.to_value()?,
            origin_id: self.origin_id.as_ref().map(|o| o.as_str().to_string()),
            created_at: self.created_at,
        })
    }

    pub fn encode(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(&self.to_wire()?)?)
    }

    pub fn decode(frame: &str) -> Result<Self, RelayError> {
        let wire: WireEnvelope = serde_json::from_str(frame)?;
        Envelope::try_from(wire)
    }

    pub fn from_value(value: Value) -> Result<Self, RelayError> {
        let wire: WireEnvelope = serde_json::from_value(value)?;
        Envelope::try_from(wire)
    }
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = RelayError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        let payload = EventPayload::from_value(wire.kind, wire.payload)
            .map_err(|e| RelayError::Decode(format!("{} payload: {e}", wire.kind)))?;
        Ok(Envelope {
            payload,
            origin_id: wire.origin_id.map(ActorId::new),
            created_at: wire.created_at,
        })
    }
}
