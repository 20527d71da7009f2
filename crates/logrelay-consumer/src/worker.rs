//! Worker that drains a bus subscription into the handlers.

use std::sync::Arc;

use logrelay_core::{LogBatchEvent, LogEvent, LogStatusEvent};
use logrelay_mq::{Envelope, EventKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::consumer::LogConsumer;

/// Pulls envelopes off a queue and invokes the matching handler.
///
/// The handler's corrective action (requeue or drop) completes before the
/// next envelope is taken, so the inbound message is fully settled when
/// the loop advances.
pub struct RelayWorker {
    id: String,
    consumer: Arc<LogConsumer>,
}

impl RelayWorker {
    pub fn new(id: impl Into<String>, consumer: Arc<LogConsumer>) -> Self {
        Self {
            id: id.into(),
            consumer,
        }
    }

    /// Run until the queue closes.
    pub async fn run(&self, mut rx: mpsc::Receiver<Envelope>) {
        info!(worker_id = %self.id, "Starting relay worker");

        while let Some(envelope) = rx.recv().await {
            self.handle(envelope).await;
        }

        info!(worker_id = %self.id, "Queue closed, stopping relay worker");
    }

    /// Process one envelope. Undecodable payloads are discarded; there is
    /// nothing meaningful to requeue.
    pub async fn handle(&self, envelope: Envelope) {
        match envelope.kind {
            EventKind::Log => match envelope.decode::<LogEvent>() {
                Ok(event) => self.consumer.on_log_event(event).await,
                Err(e) => {
                    warn!(envelope_id = %envelope.id, error = %e, "Discarding undecodable log event");
                }
            },
            EventKind::LogBatch => match envelope.decode::<LogBatchEvent>() {
                Ok(event) => self.consumer.on_log_batch_event(event).await,
                Err(e) => {
                    warn!(envelope_id = %envelope.id, error = %e, "Discarding undecodable log batch event");
                }
            },
            EventKind::LogStatus => match envelope.decode::<LogStatusEvent>() {
                Ok(event) => self.consumer.on_log_status_event(event).await,
                Err(e) => {
                    warn!(envelope_id = %envelope.id, error = %e, "Discarding undecodable log status event");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use logrelay_core::{
        ActiveStoreRegistry, ApplyResult, LogLine, StorageGateway,
    };
    use logrelay_mq::{EventDispatcher, MemoryBus};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Gateway that records everything it is asked to apply.
    #[derive(Default)]
    struct CapturingGateway {
        log_events: Mutex<Vec<LogEvent>>,
        status_events: Mutex<Vec<LogStatusEvent>>,
    }

    #[async_trait]
    impl StorageGateway for CapturingGateway {
        async fn apply_log_event(&self, event: &LogEvent) -> ApplyResult {
            self.log_events.lock().unwrap().push(event.clone());
            Ok(())
        }

        async fn apply_log_batch_event(&self, _event: &LogBatchEvent) -> ApplyResult {
            Ok(())
        }

        async fn apply_log_status_event(&self, event: &LogStatusEvent) -> ApplyResult {
            self.status_events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn make_log_event() -> LogEvent {
        LogEvent {
            build_id: "b-1".to_string(),
            logs: vec![LogLine {
                timestamp: Utc::now(),
                message: "fetching deps".to_string(),
                tag: "prepare".to_string(),
                job_id: "job-1".to_string(),
            }],
            retry_budget: 0,
            delay_ms: 0,
            target_store: None,
        }
    }

    fn make_worker(bus: Arc<MemoryBus>, gateway: Arc<CapturingGateway>) -> RelayWorker {
        let consumer = LogConsumer::new(
            gateway,
            EventDispatcher::new(bus),
            Arc::new(ActiveStoreRegistry::new(["node-a"])),
        );
        RelayWorker::new("w-1", Arc::new(consumer))
    }

    #[tokio::test]
    async fn test_dispatch_then_consume_round_trips_event() {
        let bus = Arc::new(MemoryBus::new(16));
        let mut rx = bus.subscribe(EventKind::Log).unwrap();
        let gateway = Arc::new(CapturingGateway::default());
        let dispatcher = EventDispatcher::new(bus.clone());
        let worker = make_worker(bus, gateway.clone());

        let event = make_log_event();
        dispatcher.dispatch_log_event(&event).await;

        let envelope = rx.recv().await.unwrap();
        worker.handle(envelope).await;

        let seen = gateway.log_events.lock().unwrap();
        assert_eq!(seen.as_slice(), std::slice::from_ref(&event));
    }

    #[tokio::test]
    async fn test_undecodable_envelope_is_discarded() {
        let bus = Arc::new(MemoryBus::new(16));
        let gateway = Arc::new(CapturingGateway::default());
        let worker = make_worker(bus, gateway.clone());

        // A status payload on the single-log queue cannot decode.
        let status = LogStatusEvent {
            build_id: "b-1".to_string(),
            finished: false,
            tag: "t".to_string(),
            job_id: "j".to_string(),
            execute_count: 1,
            retry_budget: 0,
            delay_ms: 0,
        };
        let envelope = Envelope::new(EventKind::Log, 0, &status).unwrap();

        worker.handle(envelope).await;

        assert!(gateway.log_events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_drains_queue_until_closed() {
        let bus = Arc::new(MemoryBus::new(16));
        let rx = bus.subscribe(EventKind::LogStatus).unwrap();
        let gateway = Arc::new(CapturingGateway::default());
        let dispatcher = EventDispatcher::new(bus.clone());
        let worker = make_worker(bus, gateway.clone());

        let event = LogStatusEvent {
            build_id: "b-3".to_string(),
            finished: true,
            tag: "deploy".to_string(),
            job_id: "job-4".to_string(),
            execute_count: 1,
            retry_budget: 0,
            delay_ms: 0,
        };
        dispatcher.dispatch_log_status_event(&event).await;

        let run = tokio::spawn(async move { worker.run(rx).await });

        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if !gateway.status_events.lock().unwrap().is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("worker should process the published event");

        run.abort();
        assert_eq!(gateway.status_events.lock().unwrap()[0], event);
    }
}
