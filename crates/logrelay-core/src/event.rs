//! Build log event types.
//!
//! Events are immutable once dispatched: a retry or failover never mutates
//! the in-flight event, it produces a new value via [`LogEvent::retry`] and
//! friends. The `retry_budget` counter only decreases across redeliveries of
//! the same logical event, except on a failover copy, which preserves it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default scheduling delay for redelivered events, in milliseconds.
pub const DEFAULT_REDELIVERY_DELAY_MS: u64 = 3_000;

/// A single line of build log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Build step tag the line belongs to.
    pub tag: String,
    pub job_id: String,
}

/// A group of log lines for one build, delivered as a single bus message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub build_id: String,
    /// Ordered log lines.
    pub logs: Vec<LogLine>,
    /// Remaining generic retries. Negative means exhausted.
    pub retry_budget: i32,
    /// Redelivery delay hint forwarded unchanged on retries.
    pub delay_ms: u64,
    /// Pins the next delivery attempt to a specific storage node. Absent
    /// means use whichever node is currently active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_store: Option<String>,
}

impl LogEvent {
    /// Copy for the generic retry path: budget decremented, target cleared.
    pub fn retry(&self) -> LogEvent {
        LogEvent {
            build_id: self.build_id.clone(),
            logs: self.logs.clone(),
            retry_budget: self.retry_budget - 1,
            delay_ms: self.delay_ms,
            target_store: None,
        }
    }

    /// Copy for the failover path: budget preserved, pinned to `store`.
    pub fn failover(&self, store: impl Into<String>) -> LogEvent {
        LogEvent {
            build_id: self.build_id.clone(),
            logs: self.logs.clone(),
            retry_budget: self.retry_budget,
            delay_ms: self.delay_ms,
            target_store: Some(store.into()),
        }
    }
}

/// Several line groups for one build, delivered as a single bus message.
/// Retry handling mirrors [`LogEvent`], only the failover ordering differs
/// at the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBatchEvent {
    pub build_id: String,
    /// Ordered groups of log lines.
    pub logs: Vec<Vec<LogLine>>,
    pub retry_budget: i32,
    pub delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_store: Option<String>,
}

impl LogBatchEvent {
    /// Copy for the generic retry path: budget decremented, target cleared.
    pub fn retry(&self) -> LogBatchEvent {
        LogBatchEvent {
            build_id: self.build_id.clone(),
            logs: self.logs.clone(),
            retry_budget: self.retry_budget - 1,
            delay_ms: self.delay_ms,
            target_store: None,
        }
    }

    /// Copy for the failover path: budget preserved, pinned to `store`.
    pub fn failover(&self, store: impl Into<String>) -> LogBatchEvent {
        LogBatchEvent {
            build_id: self.build_id.clone(),
            logs: self.logs.clone(),
            retry_budget: self.retry_budget,
            delay_ms: self.delay_ms,
            target_store: Some(store.into()),
        }
    }
}

/// Marks a build step's log stream as started or finished.
///
/// Status events are not storage-node-sensitive, so they carry no failover
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStatusEvent {
    pub build_id: String,
    pub finished: bool,
    pub tag: String,
    pub job_id: String,
    pub execute_count: u32,
    pub retry_budget: i32,
    pub delay_ms: u64,
}

impl LogStatusEvent {
    /// Copy for the generic retry path: budget decremented, every
    /// status-specific field preserved.
    pub fn retry(&self) -> LogStatusEvent {
        LogStatusEvent {
            build_id: self.build_id.clone(),
            finished: self.finished,
            tag: self.tag.clone(),
            job_id: self.job_id.clone(),
            execute_count: self.execute_count,
            retry_budget: self.retry_budget - 1,
            delay_ms: self.delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(retry_budget: i32) -> LogEvent {
        LogEvent {
            build_id: "b-1".to_string(),
            logs: vec![LogLine {
                timestamp: Utc::now(),
                message: "compiling".to_string(),
                tag: "build".to_string(),
                job_id: "job-1".to_string(),
            }],
            retry_budget,
            delay_ms: DEFAULT_REDELIVERY_DELAY_MS,
            target_store: Some("node-a".to_string()),
        }
    }

    #[test]
    fn test_retry_decrements_budget_and_clears_target() {
        let event = make_event(2);
        let copy = event.retry();

        assert_eq!(copy.retry_budget, 1);
        assert_eq!(copy.target_store, None);
        assert_eq!(copy.build_id, event.build_id);
        assert_eq!(copy.logs, event.logs);
        assert_eq!(copy.delay_ms, event.delay_ms);
    }

    #[test]
    fn test_retry_goes_negative_at_zero() {
        let event = make_event(0);
        assert_eq!(event.retry().retry_budget, -1);
    }

    #[test]
    fn test_failover_preserves_budget() {
        let event = make_event(0);
        let copy = event.failover("node-b");

        assert_eq!(copy.retry_budget, 0);
        assert_eq!(copy.target_store.as_deref(), Some("node-b"));
    }

    #[test]
    fn test_status_retry_preserves_status_fields() {
        let event = LogStatusEvent {
            build_id: "b-2".to_string(),
            finished: true,
            tag: "deploy".to_string(),
            job_id: "job-9".to_string(),
            execute_count: 3,
            retry_budget: 0,
            delay_ms: 1_000,
        };
        let copy = event.retry();

        assert_eq!(copy.retry_budget, -1);
        assert!(copy.finished);
        assert_eq!(copy.tag, "deploy");
        assert_eq!(copy.job_id, "job-9");
        assert_eq!(copy.execute_count, 3);
    }
}
