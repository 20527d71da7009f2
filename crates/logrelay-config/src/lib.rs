//! KDL configuration parsing for logrelay.
//!
//! This crate handles parsing of:
//! - Storage node declarations
//! - Retry and redelivery defaults
//! - Consumer settings

pub mod error;
pub mod relay;

pub use error::{ConfigError, ConfigResult};
pub use relay::{
    ConsumerConfig, RelayConfig, RetryConfig, StoreNodeConfig, load_relay_config,
    parse_relay_config,
};
