//! Development gateway that records applies through tracing.
//!
//! Stands in for the real storage backend during local runs. Optionally
//! fails the first N apply attempts so the retry and failover paths can be
//! watched in the logs.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use logrelay_core::{
    ApplyError, ApplyResult, LogBatchEvent, LogEvent, LogStatusEvent, StorageGateway,
};
use tracing::info;

pub struct DevGateway {
    remaining_failures: AtomicUsize,
    attempts: AtomicUsize,
    applied: AtomicUsize,
}

impl DevGateway {
    pub fn new(fail_first: usize) -> Self {
        Self {
            remaining_failures: AtomicUsize::new(fail_first),
            attempts: AtomicUsize::new(0),
            applied: AtomicUsize::new(0),
        }
    }

    /// Total apply calls seen, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Events successfully applied.
    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::Relaxed)
    }

    fn check(&self, build_id: &str) -> ApplyResult {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let remaining = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        if remaining.is_ok() {
            return Err(ApplyError::IndexCreation {
                index: format!("log-{build_id}"),
            });
        }
        self.applied.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl StorageGateway for DevGateway {
    async fn apply_log_event(&self, event: &LogEvent) -> ApplyResult {
        self.check(&event.build_id)?;
        for line in &event.logs {
            info!(build_id = %event.build_id, tag = %line.tag, "{}", line.message);
        }
        Ok(())
    }

    async fn apply_log_batch_event(&self, event: &LogBatchEvent) -> ApplyResult {
        self.check(&event.build_id)?;
        for group in &event.logs {
            for line in group {
                info!(build_id = %event.build_id, tag = %line.tag, "{}", line.message);
            }
        }
        Ok(())
    }

    async fn apply_log_status_event(&self, event: &LogStatusEvent) -> ApplyResult {
        self.check(&event.build_id)?;
        info!(
            build_id = %event.build_id,
            tag = %event.tag,
            finished = event.finished,
            "Status updated"
        );
        Ok(())
    }
}
