//! Event dispatch onto the bus.

use std::sync::Arc;

use logrelay_core::{LogBatchEvent, LogEvent, LogStatusEvent};
use tracing::warn;

use crate::bus::EventBus;
use crate::envelope::{Envelope, EventKind};

/// Publishes events on the routing path appropriate to their kind.
///
/// Dispatch is fire-and-forget with best effort: publish failures are
/// logged and absorbed, the caller's own failure handling never sees them.
#[derive(Clone)]
pub struct EventDispatcher {
    bus: Arc<dyn EventBus>,
}

impl EventDispatcher {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    /// Publish a single log event, forwarding its delay as the scheduling
    /// hint.
    pub async fn dispatch_log_event(&self, event: &LogEvent) {
        self.publish(EventKind::Log, event.delay_ms, event, &event.build_id)
            .await;
    }

    /// Publish a batched log event.
    pub async fn dispatch_log_batch_event(&self, event: &LogBatchEvent) {
        self.publish(EventKind::LogBatch, event.delay_ms, event, &event.build_id)
            .await;
    }

    /// Publish a log status event.
    pub async fn dispatch_log_status_event(&self, event: &LogStatusEvent) {
        self.publish(EventKind::LogStatus, event.delay_ms, event, &event.build_id)
            .await;
    }

    async fn publish<T: serde::Serialize>(
        &self,
        kind: EventKind,
        delay_ms: u64,
        event: &T,
        build_id: &str,
    ) {
        let envelope = match Envelope::new(kind, delay_ms, event) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(build_id = %build_id, kind = ?kind, error = %e, "Failed to encode event");
                return;
            }
        };
        if let Err(e) = self.bus.publish(envelope).await {
            warn!(build_id = %build_id, kind = ?kind, error = %e, "Failed to publish event");
        }
    }
}
