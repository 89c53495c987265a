//! Order ledger: the only writer of order records.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use event_bus::{OrderPlaced, Publisher, StockAvailable, StockUpdated, publish_best_effort};
use tokio::sync::RwLock;

use crate::error::{OrderError, Result};
use crate::order::Order;
use crate::status::OrderStatus;

/// Outcome of applying an inbound status event to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The order moved to the given status.
    Applied(OrderStatus),
    /// The transition was not allowed (replay or late event); the order
    /// keeps the given status.
    Unchanged(OrderStatus),
    /// No order with that ID.
    NotFound,
}

/// What a backlog drain did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Orders fulfilled by this pass, in FIFO order.
    pub fulfilled: Vec<OrderId>,
    /// Orders considered but too large for the stock left at that point.
    pub skipped: Vec<OrderId>,
    /// Stock left unclaimed after the pass.
    pub remaining: u32,
}

struct Slot {
    order: Order,
    /// Insertion order; breaks ties between equal `created_at` values.
    sequence: u64,
}

#[derive(Default)]
struct OrderBook {
    orders: HashMap<OrderId, Slot>,
    next_sequence: u64,
    /// `restocked_at` of the newest restock drained, per product.
    drained_restocks: HashMap<ProductId, DateTime<Utc>>,
}

impl OrderBook {
    fn insert(&mut self, order: Order) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.orders.insert(order.id(), Slot { order, sequence });
    }

    /// Marks the restock as drained. Returns false if it, or a newer
    /// restock of the same product, was drained already.
    fn claim_restock(&mut self, product_id: &ProductId, restocked_at: DateTime<Utc>) -> bool {
        match self.drained_restocks.get(product_id) {
            Some(last) if *last >= restocked_at => false,
            _ => {
                self.drained_restocks.insert(product_id.clone(), restocked_at);
                true
            }
        }
    }
}

/// Owns order records.
///
/// All reads and writes go through one lock over the order book, so a
/// status change and a backlog drain never interleave. The lock is released
/// before anything is published.
#[derive(Clone)]
pub struct OrderLedger<P: Publisher> {
    book: Arc<RwLock<OrderBook>>,
    publisher: P,
}

impl<P: Publisher> OrderLedger<P> {
    /// Creates an empty ledger that publishes through `publisher`.
    pub fn new(publisher: P) -> Self {
        Self {
            book: Arc::new(RwLock::new(OrderBook::default())),
            publisher,
        }
    }

    /// Creates a ledger preloaded with `orders`.
    pub fn with_orders(publisher: P, orders: impl IntoIterator<Item = Order>) -> Self {
        let mut book = OrderBook::default();
        for order in orders {
            book.insert(order);
        }
        Self {
            book: Arc::new(RwLock::new(book)),
            publisher,
        }
    }

    /// Creates a `Placed` order and announces it with `order-placed`.
    ///
    /// Stock is not checked here; inventory decides downstream. Identical
    /// calls create distinct orders.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, product_id: ProductId, quantity: u32) -> Result<Order> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }

        let order = Order::place(product_id, quantity, Utc::now());
        self.book.write().await.insert(order.clone());

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), "order created");

        let event = OrderPlaced {
            order_id: order.id(),
            product_id: order.product_id().clone(),
            quantity,
        };
        publish_best_effort(&self.publisher, &event).await;

        Ok(order)
    }

    /// Returns the order, or `None` if it does not exist.
    pub async fn get_by_id(&self, order_id: &OrderId) -> Option<Order> {
        let order = self
            .book
            .read()
            .await
            .orders
            .get(order_id)
            .map(|slot| slot.order.clone());
        if order.is_none() {
            tracing::debug!(%order_id, "order not found");
        }
        order
    }

    /// Returns every order, in no particular order.
    pub async fn get_all(&self) -> Vec<Order> {
        self.book
            .read()
            .await
            .orders
            .values()
            .map(|slot| slot.order.clone())
            .collect()
    }

    /// Handles `order-fulfilled`. Replays are no-ops.
    #[tracing::instrument(skip(self))]
    pub async fn on_order_fulfilled(&self, order_id: OrderId) -> StatusChange {
        self.transition(order_id, |order| order.fulfill(Utc::now()))
            .await
    }

    /// Handles `order-backordered`. Only a `Placed` order moves to `Pending`;
    /// a late backorder never regresses a `Fulfilled` order.
    #[tracing::instrument(skip(self))]
    pub async fn on_order_backordered(&self, order_id: OrderId) -> StatusChange {
        self.transition(order_id, |order| order.backorder(Utc::now()))
            .await
    }

    /// Handles `stock-available`: drains the product's backlog.
    ///
    /// Pending orders for the product are served oldest first out of the
    /// announced stock count. An order larger than what is left stays
    /// pending (its `updated_at` is touched) and the scan moves on, so one
    /// large order does not block smaller ones behind it. The pass ends when
    /// the backlog is exhausted or no stock is left. Each fulfilled order is
    /// announced with `stock-updated` so inventory can take the units off.
    ///
    /// Each restock is drained at most once: a redelivered or out-of-date
    /// `stock-available` (not newer than the last one drained for the
    /// product) returns `None` and changes nothing.
    #[tracing::instrument(skip(self, event), fields(product_id = %event.product_id, stock_count = event.stock_count))]
    pub async fn on_stock_available(&self, event: &StockAvailable) -> Option<DrainReport> {
        let started = std::time::Instant::now();
        let product_id = &event.product_id;
        let mut report = DrainReport {
            remaining: event.stock_count,
            ..DrainReport::default()
        };
        let mut announcements = Vec::new();

        {
            let mut book = self.book.write().await;
            if !book.claim_restock(product_id, event.restocked_at) {
                tracing::debug!(restocked_at = %event.restocked_at, "restock already drained, ignoring");
                return None;
            }
            let now = Utc::now();

            let mut backlog: Vec<_> = book
                .orders
                .values()
                .filter(|slot| {
                    slot.order.status() == OrderStatus::Pending
                        && slot.order.product_id() == product_id
                })
                .map(|slot| (slot.order.created_at(), slot.sequence, slot.order.id()))
                .collect();
            backlog.sort_unstable();

            for (_, _, order_id) in backlog {
                if report.remaining == 0 {
                    break;
                }
                let Some(slot) = book.orders.get_mut(&order_id) else {
                    continue;
                };
                let order = &mut slot.order;

                if order.quantity() <= report.remaining && order.fulfill(now) {
                    report.remaining -= order.quantity();
                    report.fulfilled.push(order_id);
                    announcements.push(StockUpdated {
                        order_id,
                        product_id: order.product_id().clone(),
                        quantity: order.quantity(),
                    });
                } else {
                    order.touch(now);
                    report.skipped.push(order_id);
                }
            }
        }

        for event in &announcements {
            publish_best_effort(&self.publisher, event).await;
        }

        metrics::counter!("backlog_drain_fulfilled_total").increment(report.fulfilled.len() as u64);
        metrics::histogram!("backlog_drain_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            fulfilled = report.fulfilled.len(),
            skipped = report.skipped.len(),
            remaining = report.remaining,
            "backlog drained"
        );

        Some(report)
    }

    async fn transition(
        &self,
        order_id: OrderId,
        apply: impl FnOnce(&mut Order) -> bool,
    ) -> StatusChange {
        let mut book = self.book.write().await;
        let Some(slot) = book.orders.get_mut(&order_id) else {
            tracing::warn!(%order_id, "status event for unknown order dropped");
            return StatusChange::NotFound;
        };

        let order = &mut slot.order;
        if apply(order) {
            let status = order.status();
            metrics::counter!("order_status_transitions_total", "to" => status.as_str())
                .increment(1);
            tracing::info!(%order_id, %status, "order status changed");
            StatusChange::Applied(status)
        } else {
            tracing::debug!(%order_id, status = %order.status(), "status event ignored");
            StatusChange::Unchanged(order.status())
        }
    }
}
