//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Placed ──┬──────────────► Fulfilled
///          └──► Pending ───►
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order was created; inventory has not answered yet.
    #[default]
    Placed,

    /// Inventory could not serve the order; it waits for a restock.
    Pending,

    /// Stock was committed to the order (terminal state).
    Fulfilled,
}

impl OrderStatus {
    /// Returns true if the order can move to `Fulfilled`.
    pub fn can_fulfill(&self) -> bool {
        matches!(self, OrderStatus::Placed | OrderStatus::Pending)
    }

    /// Returns true if the order can move to `Pending`.
    pub fn can_backorder(&self) -> bool {
        matches!(self, OrderStatus::Placed)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Fulfilled)
    }

    /// Returns the status name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Pending => "pending",
            OrderStatus::Fulfilled => "fulfilled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
