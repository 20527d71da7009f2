//! In-process bus for development and tests.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use crate::bus::{BusError, EventBus};
use crate::envelope::{Envelope, EventKind};
use crate::routes;

struct Channel {
    tx: mpsc::Sender<Envelope>,
    rx: std::sync::Mutex<Option<mpsc::Receiver<Envelope>>>,
}

impl Channel {
    fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: std::sync::Mutex::new(Some(rx)),
        }
    }
}

/// Tokio-channel bus with one queue per event kind.
///
/// The delay hint is honored by scheduling delivery on the runtime timer,
/// so delayed envelopes can arrive after later undelayed ones, the same
/// reordering a delay-capable broker exhibits.
pub struct MemoryBus {
    log: Channel,
    batch: Channel,
    status: Channel,
}

impl MemoryBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: Channel::new(capacity),
            batch: Channel::new(capacity),
            status: Channel::new(capacity),
        }
    }

    /// Take the consumer side of a kind's queue. Each queue has a single
    /// consumer; subsequent calls return `None`.
    pub fn subscribe(&self, kind: EventKind) -> Option<mpsc::Receiver<Envelope>> {
        self.channel(kind)
            .rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    fn channel(&self, kind: EventKind) -> &Channel {
        match kind {
            EventKind::Log => &self.log,
            EventKind::LogBatch => &self.batch,
            EventKind::LogStatus => &self.status,
        }
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventBus for MemoryBus {
    async fn publish(&self, envelope: Envelope) -> Result<(), BusError> {
        let binding = routes::binding(envelope.kind);
        let tx = self.channel(envelope.kind).tx.clone();

        if envelope.delay_ms == 0 {
            return tx
                .send(envelope)
                .await
                .map_err(|_| BusError::ChannelClosed(binding.queue.to_string()));
        }

        let delay = Duration::from_millis(envelope.delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(envelope).await.is_err() {
                warn!(queue = binding.queue, "Dropping delayed envelope, consumer gone");
            }
        });
        Ok(())
    }
}
