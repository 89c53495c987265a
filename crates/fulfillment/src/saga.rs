//! Wiring of the two ledgers to one bus.

use event_bus::{
    OrderBackordered, OrderFulfilled, OrderPlaced, Publisher, StockAvailable, StockUpdated,
};
use inventory::{InventoryLedger, Product};
use orders::{Order, OrderLedger};

use crate::router::EventRouter;

/// The orders and inventory ledgers publishing through the same bus.
///
/// Created once at startup; the ledgers are shared with the request layer
/// and with the router's handlers by cloning (they are handles to shared
/// state).
#[derive(Clone)]
pub struct Fulfillment<P: Publisher + Clone + 'static> {
    orders: OrderLedger<P>,
    inventory: InventoryLedger<P>,
}

impl<P: Publisher + Clone + 'static> Fulfillment<P> {
    /// Creates both ledgers, seeded with `products` and `orders`.
    pub fn new(
        publisher: P,
        products: impl IntoIterator<Item = Product>,
        orders: impl IntoIterator<Item = Order>,
    ) -> Self {
        Self {
            orders: OrderLedger::with_orders(publisher.clone(), orders),
            inventory: InventoryLedger::with_products(publisher, products),
        }
    }

    pub fn orders(&self) -> &OrderLedger<P> {
        &self.orders
    }

    pub fn inventory(&self) -> &InventoryLedger<P> {
        &self.inventory
    }

    /// Builds the topic table: each topic goes to the ledger that owns the
    /// entity the event is about.
    pub fn router(&self) -> EventRouter {
        let inventory = self.inventory.clone();
        let on_order_placed = move |event: OrderPlaced| {
            let inventory = inventory.clone();
            async move {
                inventory.on_order_placed(&event).await;
            }
        };

        let orders = self.orders.clone();
        let on_order_fulfilled = move |event: OrderFulfilled| {
            let orders = orders.clone();
            async move {
                orders.on_order_fulfilled(event.order_id).await;
            }
        };

        let orders = self.orders.clone();
        let on_order_backordered = move |event: OrderBackordered| {
            let orders = orders.clone();
            async move {
                orders.on_order_backordered(event.order_id).await;
            }
        };

        let orders = self.orders.clone();
        let on_stock_available = move |event: StockAvailable| {
            let orders = orders.clone();
            async move {
                orders.on_stock_available(&event).await;
            }
        };

        let inventory = self.inventory.clone();
        let on_stock_updated = move |event: StockUpdated| {
            let inventory = inventory.clone();
            async move {
                inventory.on_stock_updated(&event).await;
            }
        };

        EventRouter::builder()
            .route(on_order_placed)
            .route(on_order_fulfilled)
            .route(on_order_backordered)
            .route(on_stock_available)
            .route(on_stock_updated)
            .build()
    }
}
