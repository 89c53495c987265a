//! Inventory error types.

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The product is not known to the inventory.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
}

/// Convenience type alias for inventory results.
pub type Result<T> = std::result::Result<T, InventoryError>;
