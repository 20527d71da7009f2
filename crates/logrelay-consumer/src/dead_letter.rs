//! Optional sink for events whose retry budget is exhausted.

use async_trait::async_trait;
use logrelay_core::{LogBatchEvent, LogEvent, LogStatusEvent};

/// Receives events that would otherwise be lost when their retry budget
/// runs out.
///
/// No sink is wired by default: exhausted events are dropped with only a
/// warn-level log record, matching the pipeline's historical behavior.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn log_event_dropped(&self, event: &LogEvent);
    async fn log_batch_event_dropped(&self, event: &LogBatchEvent);
    async fn log_status_event_dropped(&self, event: &LogStatusEvent);
}
