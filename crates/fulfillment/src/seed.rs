//! Startup data.

use chrono::{DateTime, TimeZone, Utc};
use common::{OrderId, ProductId};
use inventory::Product;
use orders::{Order, OrderStatus};

/// Products the inventory starts with.
pub fn sample_products() -> Vec<Product> {
    vec![
        Product::new("p001", "Wireless Mouse", 0),
        Product::new("p002", "Mechanical Keyboard", 20),
        Product::new("p003", "USB-C Hub", 0),
    ]
}

/// Example orders in each status.
pub fn sample_orders() -> Vec<Order> {
    vec![
        Order::restore(
            OrderId::new(),
            ProductId::new("p002"),
            1,
            OrderStatus::Placed,
            utc(2024, 6, 1, 10, 0),
            utc(2024, 6, 1, 10, 0),
        ),
        Order::restore(
            OrderId::new(),
            ProductId::new("p001"),
            15,
            OrderStatus::Pending,
            utc(2024, 6, 2, 12, 30),
            utc(2024, 6, 3, 9, 15),
        ),
        Order::restore(
            OrderId::new(),
            ProductId::new("p001"),
            6,
            OrderStatus::Fulfilled,
            utc(2024, 6, 3, 14, 45),
            utc(2024, 6, 5, 16, 0),
        ),
    ]
}

fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}
