//! Serialized event envelopes.

use logrelay_core::EventId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The kind of event carried in an envelope. Selects the routing path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Log,
    LogBatch,
    LogStatus,
}

/// A serialized event plus the metadata the bus needs to route it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: EventId,
    pub kind: EventKind,
    /// Scheduling hint, honored when the bus supports delayed delivery.
    /// Advisory otherwise.
    pub delay_ms: u64,
    payload: serde_json::Value,
}

impl Envelope {
    /// Wrap an event for publishing.
    pub fn new<T: Serialize>(
        kind: EventKind,
        delay_ms: u64,
        event: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: EventId::new(),
            kind,
            delay_ms,
            payload: serde_json::to_value(event)?,
        })
    }

    /// Decode the carried event.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
