//! Publish contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::envelope::Envelope;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Publishes envelopes onto the message bus.
///
/// The envelope's delay is a scheduling hint for buses that support
/// delayed delivery.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, envelope: Envelope) -> Result<(), BusError>;
}
