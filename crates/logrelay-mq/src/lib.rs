//! Message bus seam and event dispatch for logrelay.
//!
//! The broker itself lives outside this workspace; this crate defines the
//! publish contract, the channel topology, and an in-process bus used for
//! development and tests.

pub mod bus;
pub mod dispatcher;
pub mod envelope;
pub mod memory;
pub mod routes;

pub use bus::{BusError, EventBus};
pub use dispatcher::EventDispatcher;
pub use envelope::{Envelope, EventKind};
pub use memory::MemoryBus;
pub use routes::ChannelBinding;
