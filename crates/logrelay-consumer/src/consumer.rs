//! Event handlers: apply, classify failure, requeue.

use std::sync::Arc;

use logrelay_core::{
    ActiveStoreRegistry, ApplyError, LogBatchEvent, LogEvent, LogStatusEvent, StorageGateway,
};
use logrelay_mq::EventDispatcher;
use tracing::warn;

use crate::dead_letter::DeadLetterSink;

/// One handler per event kind.
///
/// Handlers absorb every failure: the inbound message is always considered
/// consumed, and corrective action is a freshly dispatched copy (retry or
/// failover), never a broker-level requeue. The retry budget on the event
/// is the only bound on a redelivery chain.
pub struct LogConsumer {
    gateway: Arc<dyn StorageGateway>,
    dispatcher: EventDispatcher,
    registry: Arc<ActiveStoreRegistry>,
    dead_letter: Option<Arc<dyn DeadLetterSink>>,
}

impl LogConsumer {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        dispatcher: EventDispatcher,
        registry: Arc<ActiveStoreRegistry>,
    ) -> Self {
        Self {
            gateway,
            dispatcher,
            registry,
            dead_letter: None,
        }
    }

    /// Route budget-exhausted events to a sink instead of losing them.
    pub fn with_dead_letter(mut self, sink: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letter = Some(sink);
        self
    }

    /// Handle a single log event.
    ///
    /// An index-creation failure on a first attempt (budget never
    /// decremented) requeues TWO copies: one pinned to the failover node
    /// with the budget preserved, and one on the generic decremented path.
    /// Downstream applies are idempotent-enough, so the duplicate is
    /// cosmetic at worst.
    pub async fn on_log_event(&self, event: LogEvent) {
        // A pinned redelivery means that node already failed upstream;
        // stop routing new work at it before this attempt.
        if let Some(store) = &event.target_store {
            self.registry.set_inactive(store);
        }

        let mut applied = false;
        let mut requeued = false;
        match self.gateway.apply_log_event(&event).await {
            Ok(()) => applied = true,
            Err(err @ ApplyError::IndexCreation { .. }) => {
                warn!(
                    build_id = %event.build_id,
                    retry = event.retry_budget,
                    error = %err,
                    "Failed to apply log event"
                );
                if event.retry_budget <= 0 {
                    if let Some(active) = self.registry.current_active() {
                        self.dispatcher
                            .dispatch_log_event(&event.failover(active))
                            .await;
                        requeued = true;
                    }
                }
            }
            Err(err) => {
                warn!(
                    build_id = %event.build_id,
                    retry = event.retry_budget,
                    error = %err,
                    "Failed to apply log event"
                );
            }
        }

        if !applied {
            if event.retry_budget >= 0 {
                warn!(
                    build_id = %event.build_id,
                    retry = event.retry_budget,
                    "Requeueing log event"
                );
                self.dispatcher.dispatch_log_event(&event.retry()).await;
            } else if !requeued {
                self.drop_log_event(&event).await;
            }
        }
    }

    /// Handle a batched log event.
    ///
    /// Batches retry first and only fail over once the budget is spent,
    /// the reverse of the single-event ordering. The two paths are kept
    /// separate on purpose.
    pub async fn on_log_batch_event(&self, event: LogBatchEvent) {
        if let Some(store) = &event.target_store {
            self.registry.set_inactive(store);
        }

        let applied = match self.gateway.apply_log_batch_event(&event).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    build_id = %event.build_id,
                    retry = event.retry_budget,
                    error = %err,
                    "Failed to apply log batch event"
                );
                false
            }
        };

        if !applied {
            if event.retry_budget >= 0 {
                warn!(
                    build_id = %event.build_id,
                    retry = event.retry_budget,
                    "Requeueing log batch event"
                );
                self.dispatcher
                    .dispatch_log_batch_event(&event.retry())
                    .await;
            } else if let Some(active) = self.registry.current_active() {
                self.dispatcher
                    .dispatch_log_batch_event(&event.failover(active))
                    .await;
            } else {
                self.drop_log_batch_event(&event).await;
            }
        }
    }

    /// Handle a log status event. Status events are not storage-node
    /// sensitive, so there is no failover path.
    pub async fn on_log_status_event(&self, event: LogStatusEvent) {
        let applied = match self.gateway.apply_log_status_event(&event).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    build_id = %event.build_id,
                    retry = event.retry_budget,
                    error = %err,
                    "Failed to apply log status event"
                );
                false
            }
        };

        if !applied {
            if event.retry_budget >= 0 {
                warn!(
                    build_id = %event.build_id,
                    retry = event.retry_budget,
                    "Requeueing log status event"
                );
                self.dispatcher
                    .dispatch_log_status_event(&event.retry())
                    .await;
            } else {
                self.drop_log_status_event(&event).await;
            }
        }
    }

    async fn drop_log_event(&self, event: &LogEvent) {
        warn!(
            build_id = %event.build_id,
            retry = event.retry_budget,
            "Dropping log event, retry budget exhausted"
        );
        if let Some(sink) = &self.dead_letter {
            sink.log_event_dropped(event).await;
        }
    }

    async fn drop_log_batch_event(&self, event: &LogBatchEvent) {
        warn!(
            build_id = %event.build_id,
            retry = event.retry_budget,
            "Dropping log batch event, retry budget exhausted"
        );
        if let Some(sink) = &self.dead_letter {
            sink.log_batch_event_dropped(event).await;
        }
    }

    async fn drop_log_status_event(&self, event: &LogStatusEvent) {
        warn!(
            build_id = %event.build_id,
            retry = event.retry_budget,
            "Dropping log status event, retry budget exhausted"
        );
        if let Some(sink) = &self.dead_letter {
            sink.log_status_event_dropped(event).await;
        }
    }
}
