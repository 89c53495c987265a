//! Event-driven order fulfillment saga.
//!
//! There is no central coordinator: the orders and inventory ledgers react
//! to each other's events, delivered at least once over the bus.
//!
//! ```text
//! create order ─► order-placed ─► inventory ─┬─► order-fulfilled ───► orders
//!                                            └─► order-backordered ─► orders
//! restock ─► stock-available ─► orders (backlog drain) ─► stock-updated ─► inventory
//! ```
//!
//! [`EventRouter`] maps each topic to the owning ledger's handler;
//! [`Fulfillment`] builds that table for a pair of ledgers.

pub mod error;
pub mod router;
pub mod saga;
pub mod seed;

pub use error::RouteError;
pub use router::{EventRouter, RouterBuilder};
pub use saga::Fulfillment;
