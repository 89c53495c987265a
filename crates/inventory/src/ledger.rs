//! Inventory ledger: the only writer of product stock levels.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use event_bus::{
    OrderBackordered, OrderFulfilled, OrderPlaced, Publisher, StockAvailable, StockUpdated,
    publish_best_effort,
};
use tokio::sync::{Mutex, RwLock};

use crate::error::{InventoryError, Result};
use crate::product::{Product, ReservationOutcome};

/// What the inventory decided for a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementDecision {
    /// Stock was reserved; the order can be fulfilled.
    Fulfilled,
    /// Stock was insufficient or the product is unknown.
    Backordered,
}

/// Result of a successful restock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restocked {
    /// The product after the restock.
    pub product: Product,
    /// True if stock went from zero to positive.
    pub became_available: bool,
}

/// Outcome of applying a `stock-updated` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockUpdateOutcome {
    /// Stock was decremented to `stock_count`.
    Applied { stock_count: u32 },
    /// This order's update was already applied; nothing changed.
    Duplicate,
    /// The product is not known to the inventory.
    NotFound,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    decision: PlacementDecision,
    decided_at: DateTime<Utc>,
}

/// A product plus the per-order bookkeeping that makes event handling
/// idempotent. Guarded by one mutex, so a stock change and its dedup record
/// are always written together.
#[derive(Debug)]
struct StockEntry {
    product: Product,
    placements: HashMap<OrderId, Placement>,
    applied_updates: HashSet<OrderId>,
}

impl StockEntry {
    fn new(product: Product) -> Self {
        Self {
            product,
            placements: HashMap::new(),
            applied_updates: HashSet::new(),
        }
    }
}

/// Owns product stock levels.
///
/// Each product sits behind its own mutex; every change to a stock count
/// goes through [`InventoryLedger::mutate`], so reservations, restocks and
/// backlog decrements on the same product are serialized. No lock is held
/// while publishing.
#[derive(Clone)]
pub struct InventoryLedger<P: Publisher> {
    products: Arc<RwLock<HashMap<ProductId, Arc<Mutex<StockEntry>>>>>,
    publisher: P,
}

impl<P: Publisher> InventoryLedger<P> {
    /// Creates an empty inventory that publishes through `publisher`.
    pub fn new(publisher: P) -> Self {
        Self {
            products: Arc::new(RwLock::new(HashMap::new())),
            publisher,
        }
    }

    /// Creates an inventory seeded with `products`.
    pub fn with_products(publisher: P, products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|p| (p.id.clone(), Arc::new(Mutex::new(StockEntry::new(p)))))
            .collect();
        Self {
            products: Arc::new(RwLock::new(products)),
            publisher,
        }
    }

    /// Adds a product. If the ID is already known the product record is
    /// replaced and the per-order history kept, so earlier deliveries are
    /// still recognised as duplicates.
    pub async fn insert_product(&self, product: Product) {
        let mut products = self.products.write().await;
        if let Some(entry) = products.get(&product.id).cloned() {
            entry.lock().await.product = product;
        } else {
            let id = product.id.clone();
            products.insert(id, Arc::new(Mutex::new(StockEntry::new(product))));
        }
    }

    /// Returns the product, or `None` if it is unknown.
    pub async fn get_stock(&self, product_id: &ProductId) -> Option<Product> {
        let entry = self.entry(product_id).await?;
        let entry = entry.lock().await;
        Some(entry.product.clone())
    }

    /// Returns every product, ordered by ID.
    pub async fn get_all(&self) -> Vec<Product> {
        let entries: Vec<_> = self.products.read().await.values().cloned().collect();
        let mut products = Vec::with_capacity(entries.len());
        for entry in entries {
            products.push(entry.lock().await.product.clone());
        }
        products.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        products
    }

    /// Atomically takes `quantity` units if the product has that many.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(&self, product_id: &ProductId, quantity: u32) -> ReservationOutcome {
        let outcome = self
            .mutate(product_id, |entry| entry.product.try_reserve(quantity))
            .await
            .unwrap_or(ReservationOutcome::NotFound);
        record_reservation(outcome);
        outcome
    }

    /// Replaces the stock level of a product (last writer wins).
    #[tracing::instrument(skip(self))]
    pub async fn restock(&self, product_id: &ProductId, new_stock_count: u32) -> Result<Restocked> {
        let restocked = self
            .mutate(product_id, |entry| {
                let became_available = entry.product.restock(new_stock_count);
                Restocked {
                    product: entry.product.clone(),
                    became_available,
                }
            })
            .await
            .ok_or_else(|| InventoryError::ProductNotFound(product_id.clone()))?;

        metrics::counter!("stock_restocks_total").increment(1);
        tracing::info!(
            stock_count = restocked.product.stock_count,
            became_available = restocked.became_available,
            "stock replaced"
        );
        Ok(restocked)
    }

    /// Restock entry point: replaces the stock level and announces
    /// `stock-available` when the product comes back in stock.
    #[tracing::instrument(skip(self))]
    pub async fn update_stock(&self, product_id: &ProductId, new_stock_count: u32) -> Result<Product> {
        let restocked = self.restock(product_id, new_stock_count).await?;

        if restocked.became_available {
            let event = StockAvailable {
                product_id: restocked.product.id.clone(),
                product_name: restocked.product.name.clone(),
                stock_count: restocked.product.stock_count,
                restocked_at: Utc::now(),
            };
            publish_best_effort(&self.publisher, &event).await;
        }

        Ok(restocked.product)
    }

    /// Handles `order-placed`: reserves stock and reports the decision.
    ///
    /// The decision is recorded per order, so a redelivered `order-placed`
    /// re-announces the original decision instead of reserving again.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id, product_id = %event.product_id))]
    pub async fn on_order_placed(&self, event: &OrderPlaced) -> PlacementDecision {
        let order_id = event.order_id;
        let placement = self
            .mutate(&event.product_id, |entry| {
                if let Some(existing) = entry.placements.get(&order_id) {
                    return (*existing, true);
                }
                let decision = match entry.product.try_reserve(event.quantity) {
                    ReservationOutcome::Reserved => PlacementDecision::Fulfilled,
                    _ => PlacementDecision::Backordered,
                };
                let placement = Placement {
                    decision,
                    decided_at: Utc::now(),
                };
                entry.placements.insert(order_id, placement);
                (placement, false)
            })
            .await;

        let placement = match placement {
            Some((placement, true)) => {
                tracing::debug!(decision = ?placement.decision, "duplicate order-placed, re-announcing decision");
                placement
            }
            Some((placement, false)) => {
                record_reservation(match placement.decision {
                    PlacementDecision::Fulfilled => ReservationOutcome::Reserved,
                    PlacementDecision::Backordered => ReservationOutcome::Insufficient,
                });
                placement
            }
            None => {
                tracing::warn!("order references unknown product, backordering");
                record_reservation(ReservationOutcome::NotFound);
                Placement {
                    decision: PlacementDecision::Backordered,
                    decided_at: Utc::now(),
                }
            }
        };

        match placement.decision {
            PlacementDecision::Fulfilled => {
                let fulfilled = OrderFulfilled {
                    order_id,
                    product_id: event.product_id.clone(),
                    quantity: event.quantity,
                    fulfilled_at: placement.decided_at,
                };
                publish_best_effort(&self.publisher, &fulfilled).await;
            }
            PlacementDecision::Backordered => {
                let backordered = OrderBackordered {
                    order_id,
                    product_id: event.product_id.clone(),
                    quantity: event.quantity,
                    backordered_at: placement.decided_at,
                };
                publish_best_effort(&self.publisher, &backordered).await;
            }
        }

        tracing::info!(decision = ?placement.decision, "order placement decided");
        placement.decision
    }

    /// Handles `stock-updated`: takes the quantity promised to a backlog
    /// order off the stock, flooring at zero. Applied at most once per order.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id, product_id = %event.product_id))]
    pub async fn on_stock_updated(&self, event: &StockUpdated) -> StockUpdateOutcome {
        let outcome = self
            .mutate(&event.product_id, |entry| {
                if !entry.applied_updates.insert(event.order_id) {
                    return StockUpdateOutcome::Duplicate;
                }
                entry.product.deduct(event.quantity);
                StockUpdateOutcome::Applied {
                    stock_count: entry.product.stock_count,
                }
            })
            .await
            .unwrap_or(StockUpdateOutcome::NotFound);

        match outcome {
            StockUpdateOutcome::Applied { stock_count } => {
                tracing::info!(quantity = event.quantity, stock_count, "stock decremented for backlog order");
            }
            StockUpdateOutcome::Duplicate => {
                tracing::debug!("duplicate stock-updated ignored");
            }
            StockUpdateOutcome::NotFound => {
                tracing::warn!("stock-updated for unknown product dropped");
            }
        }
        outcome
    }

    async fn entry(&self, product_id: &ProductId) -> Option<Arc<Mutex<StockEntry>>> {
        self.products.read().await.get(product_id).cloned()
    }

    /// Runs `f` on the product's entry while holding its lock. Returns `None`
    /// if the product is unknown.
    async fn mutate<R>(
        &self,
        product_id: &ProductId,
        f: impl FnOnce(&mut StockEntry) -> R,
    ) -> Option<R> {
        let entry = self.entry(product_id).await?;
        let mut entry = entry.lock().await;
        Some(f(&mut entry))
    }
}

fn record_reservation(outcome: ReservationOutcome) {
    let label = match outcome {
        ReservationOutcome::Reserved => "reserved",
        ReservationOutcome::Insufficient => "insufficient",
        ReservationOutcome::NotFound => "not_found",
    };
    metrics::counter!("stock_reservations_total", "outcome" => label).increment(1);
}
