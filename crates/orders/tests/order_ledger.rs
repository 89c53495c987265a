//! Integration tests for the order ledger.
//!
//! These tests cover the order lifecycle under replayed and late events and
//! the FIFO backlog drain.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use event_bus::{InMemoryBus, OrderPlaced, StockAvailable, StockUpdated, topics};
use orders::{DrainReport, Order, OrderLedger, OrderStatus, StatusChange};

fn setup() -> (OrderLedger<InMemoryBus>, InMemoryBus) {
    let bus = InMemoryBus::recording();
    (OrderLedger::new(bus.clone()), bus)
}

/// Creates an order and moves it to `Pending`.
async fn pending_order(ledger: &OrderLedger<InMemoryBus>, product: &str, quantity: u32) -> Order {
    let order = ledger
        .create(ProductId::new(product), quantity)
        .await
        .unwrap();
    assert_eq!(
        ledger.on_order_backordered(order.id()).await,
        StatusChange::Applied(OrderStatus::Pending)
    );
    order
}

/// A restock announcement; `tick` orders announcements in time.
fn restock(product: &str, stock_count: u32, tick: i64) -> StockAvailable {
    StockAvailable {
        product_id: ProductId::new(product),
        product_name: "Wireless Mouse".to_string(),
        stock_count,
        restocked_at: DateTime::<Utc>::from_timestamp(1_717_200_000 + tick, 0).unwrap(),
    }
}

async fn drain(
    ledger: &OrderLedger<InMemoryBus>,
    product: &str,
    stock_count: u32,
    tick: i64,
) -> DrainReport {
    ledger
        .on_stock_available(&restock(product, stock_count, tick))
        .await
        .expect("restock should be drained")
}

async fn status_of(ledger: &OrderLedger<InMemoryBus>, id: OrderId) -> OrderStatus {
    ledger.get_by_id(&id).await.unwrap().status()
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn create_stores_placed_order_and_announces_it() {
        let (ledger, bus) = setup();

        let order = ledger.create(ProductId::new("p003"), 5).await.unwrap();

        assert_eq!(order.status(), OrderStatus::Placed);
        assert_eq!(order.product_id(), &ProductId::new("p003"));
        assert_eq!(order.quantity(), 5);
        assert_eq!(order.created_at(), order.updated_at());
        assert_eq!(ledger.get_by_id(&order.id()).await, Some(order.clone()));

        let messages = bus.published_on(topics::ORDER_PLACED).await;
        assert_eq!(messages.len(), 1);
        let placed: OrderPlaced = messages[0].decode().unwrap();
        assert_eq!(placed.order_id, order.id());
        assert_eq!(placed.quantity, 5);
    }

    #[tokio::test]
    async fn identical_creates_make_distinct_orders() {
        let (ledger, _) = setup();

        let a = ledger.create(ProductId::new("p002"), 1).await.unwrap();
        let b = ledger.create(ProductId::new("p002"), 1).await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(ledger.get_all().await.len(), 2);
    }

    #[tokio::test]
    async fn missing_order_is_none() {
        let (ledger, _) = setup();
        assert!(ledger.get_by_id(&OrderId::new()).await.is_none());
    }

    #[tokio::test]
    async fn publish_failure_still_creates_order() {
        let (ledger, bus) = setup();
        bus.set_fail_on_publish(true);

        let order = ledger.create(ProductId::new("p001"), 2).await.unwrap();

        assert!(ledger.get_by_id(&order.id()).await.is_some());
        assert_eq!(bus.message_count().await, 0);
    }
}

mod status_events {
    use super::*;

    #[tokio::test]
    async fn fulfilled_replay_is_a_no_op() {
        let (ledger, bus) = setup();
        let order = ledger.create(ProductId::new("p002"), 1).await.unwrap();
        let published_before = bus.message_count().await;

        assert_eq!(
            ledger.on_order_fulfilled(order.id()).await,
            StatusChange::Applied(OrderStatus::Fulfilled)
        );
        let after_first = ledger.get_by_id(&order.id()).await.unwrap();

        assert_eq!(
            ledger.on_order_fulfilled(order.id()).await,
            StatusChange::Unchanged(OrderStatus::Fulfilled)
        );
        let after_second = ledger.get_by_id(&order.id()).await.unwrap();

        assert_eq!(after_first, after_second);
        assert_eq!(bus.message_count().await, published_before);
    }

    #[tokio::test]
    async fn backorder_moves_placed_to_pending() {
        let (ledger, _) = setup();
        let order = pending_order(&ledger, "p001", 1).await;

        let stored = ledger.get_by_id(&order.id()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Pending);
        assert!(stored.updated_at() >= order.updated_at());
    }

    #[tokio::test]
    async fn late_backorder_does_not_regress_fulfilled() {
        let (ledger, _) = setup();
        let order = ledger.create(ProductId::new("p002"), 1).await.unwrap();
        ledger.on_order_fulfilled(order.id()).await;

        assert_eq!(
            ledger.on_order_backordered(order.id()).await,
            StatusChange::Unchanged(OrderStatus::Fulfilled)
        );
        assert_eq!(status_of(&ledger, order.id()).await, OrderStatus::Fulfilled);
    }

    #[tokio::test]
    async fn pending_order_can_be_fulfilled() {
        let (ledger, _) = setup();
        let order = pending_order(&ledger, "p001", 1).await;

        assert_eq!(
            ledger.on_order_fulfilled(order.id()).await,
            StatusChange::Applied(OrderStatus::Fulfilled)
        );
    }
}

mod backlog_drain {
    use super::*;

    #[tokio::test]
    async fn large_order_does_not_block_smaller_ones() {
        let (ledger, bus) = setup();
        let a = pending_order(&ledger, "p001", 6).await;
        let b = pending_order(&ledger, "p001", 3).await;
        let a_touched_before = ledger.get_by_id(&a.id()).await.unwrap().updated_at();

        let report = drain(&ledger, "p001", 3, 1).await;

        assert_eq!(report.fulfilled, vec![b.id()]);
        assert_eq!(report.skipped, vec![a.id()]);
        assert_eq!(report.remaining, 0);
        assert_eq!(status_of(&ledger, a.id()).await, OrderStatus::Pending);
        assert_eq!(status_of(&ledger, b.id()).await, OrderStatus::Fulfilled);

        let a_after = ledger.get_by_id(&a.id()).await.unwrap();
        assert!(a_after.updated_at() >= a_touched_before);

        let updates = bus.published_on(topics::STOCK_UPDATED).await;
        assert_eq!(updates.len(), 1);
        let update: StockUpdated = updates[0].decode().unwrap();
        assert_eq!(update.order_id, b.id());
        assert_eq!(update.quantity, 3);
    }

    #[tokio::test]
    async fn keeps_draining_after_first_fulfillment() {
        let (ledger, bus) = setup();
        let a = pending_order(&ledger, "p001", 2).await;
        let b = pending_order(&ledger, "p001", 3).await;
        let c = pending_order(&ledger, "p001", 4).await;

        let report = drain(&ledger, "p001", 10, 1).await;

        assert_eq!(report.fulfilled, vec![a.id(), b.id(), c.id()]);
        assert_eq!(report.remaining, 1);
        assert_eq!(bus.published_on(topics::STOCK_UPDATED).await.len(), 3);
    }

    #[tokio::test]
    async fn serves_oldest_first() {
        let (ledger, _) = setup();
        let first = pending_order(&ledger, "p001", 5).await;
        let second = pending_order(&ledger, "p001", 5).await;

        let report = drain(&ledger, "p001", 5, 1).await;

        assert_eq!(report.fulfilled, vec![first.id()]);
        assert_eq!(status_of(&ledger, second.id()).await, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn greedy_pass_is_not_optimal() {
        let (ledger, _) = setup();
        let a = pending_order(&ledger, "p001", 4).await;
        let b = pending_order(&ledger, "p001", 3).await;
        let c = pending_order(&ledger, "p001", 3).await;

        let report = drain(&ledger, "p001", 6, 1).await;

        // b + c would use all 6 units, but a has first claim.
        assert_eq!(report.fulfilled, vec![a.id()]);
        assert_eq!(report.skipped, vec![b.id(), c.id()]);
        assert_eq!(report.remaining, 2);
    }

    #[tokio::test]
    async fn stops_when_stock_is_used_up() {
        let (ledger, _) = setup();
        let a = pending_order(&ledger, "p001", 3).await;
        let b = pending_order(&ledger, "p001", 1).await;
        let b_before = ledger.get_by_id(&b.id()).await.unwrap();

        let report = drain(&ledger, "p001", 3, 1).await;

        assert_eq!(report.fulfilled, vec![a.id()]);
        assert!(report.skipped.is_empty());
        assert_eq!(ledger.get_by_id(&b.id()).await.unwrap(), b_before);
    }

    #[tokio::test]
    async fn only_pending_orders_of_the_product_are_drained() {
        let (ledger, _) = setup();
        let placed = ledger.create(ProductId::new("p001"), 1).await.unwrap();
        let other_product = pending_order(&ledger, "p002", 1).await;
        let fulfilled = ledger.create(ProductId::new("p001"), 1).await.unwrap();
        ledger.on_order_fulfilled(fulfilled.id()).await;
        let pending = pending_order(&ledger, "P001", 1).await;

        let report = drain(&ledger, "p001", 10, 1).await;

        assert_eq!(report.fulfilled, vec![pending.id()]);
        assert_eq!(status_of(&ledger, placed.id()).await, OrderStatus::Placed);
        assert_eq!(
            status_of(&ledger, other_product.id()).await,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn repeated_stock_available_does_not_double_fulfill() {
        let (ledger, bus) = setup();
        let a = pending_order(&ledger, "p001", 2).await;
        let event = restock("p001", 5, 1);

        ledger.on_stock_available(&event).await.unwrap();
        let replay = ledger.on_stock_available(&event).await;

        assert_eq!(replay, None);
        assert_eq!(status_of(&ledger, a.id()).await, OrderStatus::Fulfilled);
        assert_eq!(bus.published_on(topics::STOCK_UPDATED).await.len(), 1);
    }

    #[tokio::test]
    async fn replayed_restock_does_not_serve_skipped_orders() {
        let (ledger, bus) = setup();
        let a = pending_order(&ledger, "p001", 6).await;
        let b = pending_order(&ledger, "p001", 5).await;
        let event = restock("p001", 10, 1);

        let report = ledger.on_stock_available(&event).await.unwrap();
        assert_eq!(report.fulfilled, vec![a.id()]);
        assert_eq!(report.skipped, vec![b.id()]);
        let b_before = ledger.get_by_id(&b.id()).await.unwrap();

        assert_eq!(ledger.on_stock_available(&event).await, None);

        assert_eq!(ledger.get_by_id(&b.id()).await.unwrap(), b_before);
        assert_eq!(bus.published_on(topics::STOCK_UPDATED).await.len(), 1);
    }

    #[tokio::test]
    async fn older_restock_is_ignored_after_newer_one() {
        let (ledger, _) = setup();
        let a = pending_order(&ledger, "p001", 4).await;

        drain(&ledger, "p001", 1, 5).await;
        let late = ledger.on_stock_available(&restock("P001", 10, 2)).await;

        assert_eq!(late, None);
        assert_eq!(status_of(&ledger, a.id()).await, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn newer_restock_drains_again() {
        let (ledger, _) = setup();
        let a = pending_order(&ledger, "p001", 6).await;
        let b = pending_order(&ledger, "p001", 5).await;

        drain(&ledger, "p001", 10, 1).await;
        let report = drain(&ledger, "p001", 5, 2).await;

        assert_eq!(report.fulfilled, vec![b.id()]);
        assert_eq!(status_of(&ledger, a.id()).await, OrderStatus::Fulfilled);
        assert_eq!(status_of(&ledger, b.id()).await, OrderStatus::Fulfilled);
    }

    #[tokio::test]
    async fn restocks_are_tracked_per_product() {
        let (ledger, _) = setup();
        let mouse = pending_order(&ledger, "p001", 1).await;
        let hub = pending_order(&ledger, "p003", 1).await;

        drain(&ledger, "p001", 1, 1).await;
        drain(&ledger, "p003", 1, 1).await;

        assert_eq!(status_of(&ledger, mouse.id()).await, OrderStatus::Fulfilled);
        assert_eq!(status_of(&ledger, hub.id()).await, OrderStatus::Fulfilled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_drains_fulfill_each_order_once() {
        let (ledger, bus) = setup();
        let ledger = Arc::new(ledger);
        for _ in 0..10 {
            pending_order(&ledger, "p001", 1).await;
        }

        let handles: Vec<_> = (0..4)
            .map(|tick| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger.on_stock_available(&restock("p001", 10, tick)).await
                })
            })
            .collect();

        // Drains arriving after a newer one are skipped entirely.
        let mut fulfilled = 0;
        for handle in handles {
            fulfilled += handle.await.unwrap().map_or(0, |r| r.fulfilled.len());
        }
        assert_eq!(fulfilled, 10);
        assert_eq!(bus.published_on(topics::STOCK_UPDATED).await.len(), 10);
    }
}
