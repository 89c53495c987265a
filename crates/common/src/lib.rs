//! Identifiers shared by the orders and inventory domains.

mod types;

pub use types::{OrderId, ProductId};
