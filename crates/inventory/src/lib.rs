//! Inventory domain of the fulfillment saga.
//!
//! The [`InventoryLedger`] owns product stock levels. It decides whether an
//! incoming order can be served from stock, applies decrements for orders
//! served through the orders backlog, and announces when a product comes
//! back in stock.

pub mod error;
pub mod ledger;
pub mod product;

pub use error::{InventoryError, Result};
pub use ledger::{InventoryLedger, PlacementDecision, Restocked, StockUpdateOutcome};
pub use product::{Product, ReservationOutcome};
