//! Core domain types and traits for the logrelay delivery pipeline.
//!
//! This crate contains:
//! - Build log event types carried on the bus
//! - The storage gateway seam and its failure taxonomy
//! - The active-store registry shared by consumers

pub mod event;
pub mod id;
pub mod registry;
pub mod storage;

pub use event::{DEFAULT_REDELIVERY_DELAY_MS, LogBatchEvent, LogEvent, LogLine, LogStatusEvent};
pub use id::EventId;
pub use registry::ActiveStoreRegistry;
pub use storage::{ApplyError, ApplyResult, StorageGateway};
