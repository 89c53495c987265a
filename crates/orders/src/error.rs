//! Order error types.

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Quantity must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },
}

/// Convenience type alias for order results.
pub type Result<T> = std::result::Result<T, OrderError>;
