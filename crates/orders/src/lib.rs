//! Orders domain of the fulfillment saga.
//!
//! The [`OrderLedger`] owns order records. Orders are created `Placed`,
//! move to `Pending` when inventory backorders them and to `Fulfilled` when
//! stock is reserved for them, either right away or when a restock drains
//! the backlog.

pub mod error;
pub mod ledger;
pub mod order;
pub mod status;

pub use error::{OrderError, Result};
pub use ledger::{DrainReport, OrderLedger, StatusChange};
pub use order::Order;
pub use status::OrderStatus;
