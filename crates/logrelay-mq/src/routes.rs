//! Channel topology.
//!
//! Queue, exchange, and routing-key names must remain stable: redelivered
//! events from older consumers still land on these paths.

use crate::envelope::EventKind;

pub const EXCHANGE_LOG_EVENT: &str = "e.build.log.event";
pub const QUEUE_LOG_EVENT: &str = "q.build.log.event";
pub const ROUTE_LOG_EVENT: &str = "r.build.log.event";

pub const EXCHANGE_LOG_BATCH_EVENT: &str = "e.build.log.batch.event";
pub const QUEUE_LOG_BATCH_EVENT: &str = "q.build.log.batch.event";
pub const ROUTE_LOG_BATCH_EVENT: &str = "r.build.log.batch.event";

pub const EXCHANGE_LOG_STATUS_EVENT: &str = "e.build.log.status.event";
pub const QUEUE_LOG_STATUS_EVENT: &str = "q.build.log.status.event";
pub const ROUTE_LOG_STATUS_EVENT: &str = "r.build.log.status.event";

/// Declarative binding for one logical channel, consumed by whichever bus
/// implementation talks to a real broker. Exchanges are direct-routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBinding {
    pub exchange: &'static str,
    pub queue: &'static str,
    pub routing_key: &'static str,
    pub durable: bool,
    /// Whether the exchange supports delayed delivery. When false the
    /// envelope's delay hint is advisory only.
    pub delayed: bool,
}

/// The binding for an event kind.
pub fn binding(kind: EventKind) -> ChannelBinding {
    match kind {
        EventKind::Log => ChannelBinding {
            exchange: EXCHANGE_LOG_EVENT,
            queue: QUEUE_LOG_EVENT,
            routing_key: ROUTE_LOG_EVENT,
            durable: false,
            delayed: true,
        },
        EventKind::LogBatch => ChannelBinding {
            exchange: EXCHANGE_LOG_BATCH_EVENT,
            queue: QUEUE_LOG_BATCH_EVENT,
            routing_key: ROUTE_LOG_BATCH_EVENT,
            durable: false,
            delayed: true,
        },
        EventKind::LogStatus => ChannelBinding {
            exchange: EXCHANGE_LOG_STATUS_EVENT,
            queue: QUEUE_LOG_STATUS_EVENT,
            routing_key: ROUTE_LOG_STATUS_EVENT,
            durable: true,
            delayed: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_channel_is_durable_and_delayed() {
        let binding = binding(EventKind::LogStatus);
        assert!(binding.durable);
        assert!(binding.delayed);
        assert_eq!(binding.queue, QUEUE_LOG_STATUS_EVENT);
    }

    #[test]
    fn test_bindings_are_distinct() {
        let queues = [
            binding(EventKind::Log).queue,
            binding(EventKind::LogBatch).queue,
            binding(EventKind::LogStatus).queue,
        ];
        assert_eq!(
            queues.len(),
            queues.iter().collect::<std::collections::HashSet<_>>().len()
        );
    }
}
