//! Order record.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// An order for a quantity of one product.
///
/// ID, product and quantity never change after creation; status changes go
/// through [`Order::fulfill`] and [`Order::backorder`], which only allow
/// forward transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    product_id: ProductId,
    quantity: u32,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new `Placed` order.
    pub(crate) fn place(product_id: ProductId, quantity: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            product_id,
            quantity,
            status: OrderStatus::Placed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds an order from stored fields, e.g. for seed data.
    pub fn restore(
        id: OrderId,
        product_id: ProductId,
        quantity: u32,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            quantity,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last time the order changed status or was considered by a backlog drain.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the order to `Fulfilled`. Returns false if it already was.
    pub(crate) fn fulfill(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.can_fulfill() {
            return false;
        }
        self.status = OrderStatus::Fulfilled;
        self.touch(now);
        true
    }

    /// Moves a `Placed` order to `Pending`. Returns false otherwise.
    pub(crate) fn backorder(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.can_backorder() {
            return false;
        }
        self.status = OrderStatus::Pending;
        self.touch(now);
        true
    }

    /// Moves `updated_at` forward without changing status.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
