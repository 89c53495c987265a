//! Event transport for the fulfillment saga.
//!
//! Provides the topic contracts exchanged between the orders and inventory
//! domains, the [`Publisher`] seam the ledgers publish through, and an
//! at-least-once in-memory bus used by the server and the tests.

pub mod contracts;
pub mod error;
pub mod memory;
pub mod message;
pub mod publisher;

pub use contracts::{
    IntegrationEvent, OrderBackordered, OrderFulfilled, OrderPlaced, StockAvailable,
    StockUpdated, topics,
};
pub use error::{BusError, Result};
pub use memory::InMemoryBus;
pub use message::{Message, MessageBuilder, MessageId};
pub use publisher::{Publisher, publish_best_effort, publish_event};
