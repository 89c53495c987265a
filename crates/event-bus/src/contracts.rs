//! Payload contracts for the topics exchanged between the two domains.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Topic names.
pub mod topics {
    /// Emitted by the orders domain when an order is created.
    pub const ORDER_PLACED: &str = "order-placed";

    /// Emitted by the inventory domain when stock was reserved for an order.
    pub const ORDER_FULFILLED: &str = "order-fulfilled";

    /// Emitted by the inventory domain when an order could not be served.
    pub const ORDER_BACKORDERED: &str = "order-backordered";

    /// Emitted by the inventory domain when a product's stock goes from zero to positive.
    pub const STOCK_AVAILABLE: &str = "stock-available";

    /// Emitted by the orders domain for each backlog order served by a restock.
    pub const STOCK_UPDATED: &str = "stock-updated";

    /// Every topic the saga exchanges.
    pub const ALL: [&str; 5] = [
        ORDER_PLACED,
        ORDER_FULFILLED,
        ORDER_BACKORDERED,
        STOCK_AVAILABLE,
        STOCK_UPDATED,
    ];
}

/// A typed event bound to exactly one topic.
pub trait IntegrationEvent: Serialize + DeserializeOwned + Send + Sync {
    /// The topic this event is published on.
    const TOPIC: &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl IntegrationEvent for OrderPlaced {
    const TOPIC: &'static str = topics::ORDER_PLACED;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFulfilled {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub fulfilled_at: DateTime<Utc>,
}

impl IntegrationEvent for OrderFulfilled {
    const TOPIC: &'static str = topics::ORDER_FULFILLED;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBackordered {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub backordered_at: DateTime<Utc>,
}

impl IntegrationEvent for OrderBackordered {
    const TOPIC: &'static str = topics::ORDER_BACKORDERED;
}

/// Stock of a product crossed from zero to positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAvailable {
    pub product_id: ProductId,
    pub product_name: String,
    /// Stock level right after the restock.
    pub stock_count: u32,
    pub restocked_at: DateTime<Utc>,
}

impl IntegrationEvent for StockAvailable {
    const TOPIC: &'static str = topics::STOCK_AVAILABLE;
}

/// A backlog order was served; inventory must take `quantity` off its stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdated {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl IntegrationEvent for StockUpdated {
    const TOPIC: &'static str = topics::STOCK_UPDATED;
}
