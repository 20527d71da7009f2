//! Relay configuration parsing.

use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use logrelay_core::event::DEFAULT_REDELIVERY_DELAY_MS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full relay configuration (logrelay.kdl).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Storage nodes in preference order. The first usable node is the
    /// initial active one.
    pub stores: Vec<StoreNodeConfig>,
    pub retry: RetryConfig,
    pub consumer: ConsumerConfig,
}

impl RelayConfig {
    /// Node names in declaration order, for seeding the active-store
    /// registry.
    pub fn store_names(&self) -> Vec<String> {
        self.stores.iter().map(|s| s.name.clone()).collect()
    }
}

/// A single storage node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreNodeConfig {
    pub name: String,
    pub url: Option<String>,
}

/// Retry and redelivery defaults applied to freshly produced events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Redelivery delay hint in milliseconds.
    pub delay_ms: u64,
    /// Retry budget stamped on fresh events.
    pub initial_budget: i32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_REDELIVERY_DELAY_MS,
            initial_budget: 0,
        }
    }
}

/// Consumer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Buffered envelopes per queue before publishers are backpressured.
    pub queue_capacity: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

/// Load a relay configuration from a file.
pub fn load_relay_config(path: impl AsRef<Path>) -> ConfigResult<RelayConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_relay_config(&text)
}

/// Parse a relay configuration from KDL text.
pub fn parse_relay_config(kdl: &str) -> ConfigResult<RelayConfig> {
    let doc: KdlDocument = kdl.parse()?;

    let mut stores = Vec::new();
    let mut retry = RetryConfig::default();
    let mut consumer = ConsumerConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "store" => {
                stores.push(parse_store(node)?);
            }
            "retry" => {
                retry = parse_retry(node)?;
            }
            "consumer" => {
                consumer = parse_consumer(node)?;
            }
            _ => {} // Ignore unknown nodes
        }
    }

    if stores.is_empty() {
        return Err(ConfigError::MissingField("store".to_string()));
    }

    let mut seen = std::collections::HashSet::new();
    for store in &stores {
        if !seen.insert(store.name.as_str()) {
            return Err(ConfigError::Duplicate(format!("store '{}'", store.name)));
        }
    }

    if consumer.queue_capacity == 0 {
        return Err(ConfigError::InvalidValue {
            field: "consumer queue-capacity".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    Ok(RelayConfig {
        stores,
        retry,
        consumer,
    })
}

fn parse_store(node: &KdlNode) -> ConfigResult<StoreNodeConfig> {
    let name = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField("store name".to_string()))?;
    let url = get_string_prop(node, "url");

    Ok(StoreNodeConfig { name, url })
}

fn parse_retry(node: &KdlNode) -> ConfigResult<RetryConfig> {
    let mut retry = RetryConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "delay-ms" => {
                    let value = get_first_integer_arg(child).ok_or_else(|| {
                        ConfigError::MissingField("retry delay-ms".to_string())
                    })?;
                    retry.delay_ms =
                        u64::try_from(value).map_err(|_| ConfigError::InvalidValue {
                            field: "retry delay-ms".to_string(),
                            message: format!("must be a non-negative integer, got {value}"),
                        })?;
                }
                "initial-budget" => {
                    let value = get_first_integer_arg(child).ok_or_else(|| {
                        ConfigError::MissingField("retry initial-budget".to_string())
                    })?;
                    retry.initial_budget =
                        i32::try_from(value).map_err(|_| ConfigError::InvalidValue {
                            field: "retry initial-budget".to_string(),
                            message: format!("out of range: {value}"),
                        })?;
                }
                _ => {}
            }
        }
    }

    Ok(retry)
}

fn parse_consumer(node: &KdlNode) -> ConfigResult<ConsumerConfig> {
    let mut consumer = ConsumerConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "queue-capacity" {
                let value = get_first_integer_arg(child).ok_or_else(|| {
                    ConfigError::MissingField("consumer queue-capacity".to_string())
                })?;
                consumer.queue_capacity =
                    usize::try_from(value).map_err(|_| ConfigError::InvalidValue {
                        field: "consumer queue-capacity".to_string(),
                        message: format!("must be a non-negative integer, got {value}"),
                    })?;
            }
        }
    }

    Ok(consumer)
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_first_integer_arg(node: &KdlNode) -> Option<i128> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
store "es-node-1" url="http://localhost:9200"
store "es-node-2" url="http://localhost:9201"

retry {
    delay-ms 5000
    initial-budget 2
}

consumer {
    queue-capacity 256
}
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_relay_config(FULL).unwrap();

        assert_eq!(config.stores.len(), 2);
        assert_eq!(config.stores[0].name, "es-node-1");
        assert_eq!(
            config.stores[0].url.as_deref(),
            Some("http://localhost:9200")
        );
        assert_eq!(config.retry.delay_ms, 5_000);
        assert_eq!(config.retry.initial_budget, 2);
        assert_eq!(config.consumer.queue_capacity, 256);
        assert_eq!(config.store_names(), vec!["es-node-1", "es-node-2"]);
    }

    #[test]
    fn test_defaults_apply_when_blocks_absent() {
        let config = parse_relay_config(r#"store "only-node""#).unwrap();

        assert_eq!(config.retry.delay_ms, DEFAULT_REDELIVERY_DELAY_MS);
        assert_eq!(config.retry.initial_budget, 0);
        assert_eq!(config.consumer.queue_capacity, 1024);
    }

    #[test]
    fn test_no_stores_is_an_error() {
        let result = parse_relay_config("retry { delay-ms 100 }");
        assert!(matches!(result, Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_duplicate_store_names_rejected() {
        let result = parse_relay_config(
            r#"
store "node-a"
store "node-a"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Duplicate(_))));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let result = parse_relay_config(
            r#"
store "node-a"
retry { delay-ms -1 }
"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let result = parse_relay_config(
            r#"
store "node-a"
consumer { queue-capacity 0 }
"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_malformed_kdl_is_a_parse_error() {
        let result = parse_relay_config(r#"store "unterminated"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
