//! Product stock record.

use common::ProductId;
use serde::{Deserialize, Serialize};

/// A product and its current stock level.
///
/// `stock_count` is the only field that changes after seeding; being
/// unsigned it can never go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub stock_count: u32,
}

/// Outcome of an attempt to reserve stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// Stock was sufficient and has been decremented.
    Reserved,
    /// Stock was insufficient; nothing changed.
    Insufficient,
    /// The product is not known to the inventory.
    NotFound,
}

impl Product {
    /// Creates a product with an initial stock level.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, stock_count: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stock_count,
        }
    }

    /// Returns true if at least one unit is in stock.
    pub fn in_stock(&self) -> bool {
        self.stock_count > 0
    }

    /// Takes `quantity` units if enough are available.
    pub(crate) fn try_reserve(&mut self, quantity: u32) -> ReservationOutcome {
        if self.stock_count >= quantity {
            self.stock_count -= quantity;
            ReservationOutcome::Reserved
        } else {
            ReservationOutcome::Insufficient
        }
    }

    /// Takes `quantity` units unconditionally, flooring at zero.
    pub(crate) fn deduct(&mut self, quantity: u32) {
        self.stock_count = self.stock_count.saturating_sub(quantity);
    }

    /// Replaces the stock level. Returns true if the product went from
    /// out of stock to in stock.
    pub(crate) fn restock(&mut self, new_stock_count: u32) -> bool {
        let was_empty = self.stock_count == 0;
        self.stock_count = new_stock_count;
        was_empty && self.in_stock()
    }
}
