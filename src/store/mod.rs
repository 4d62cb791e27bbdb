//! Storage seams for inventory and orders.
//!
//! Handlers only talk to these traits. `postgres` is the production backend,
//! `memory` backs `STORAGE_BACKEND=memory` and the test suite.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CartLineInput, Order, OrderStatus, Product};

pub use memory::{MemoryInventoryStore, MemoryOrderStore};
pub use postgres::{PgInventoryStore, PgOrderStore};

/// Stock only moves by whole positive quantities.
pub(crate) fn check_quantity(quantity: i32, item: impl std::fmt::Display) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::Validation(format!("Invalid quantity {} for {}", quantity, item)));
    }
    Ok(())
}

/// Every line must carry a positive quantity.
pub(crate) fn check_lines(lines: &[CartLineInput]) -> AppResult<()> {
    lines
        .iter()
        .try_for_each(|line| check_quantity(line.quantity, line.display_name()))
}

/// Authoritative source of product price and stock.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Store a new product.
    async fn insert_product(&self, product: Product) -> AppResult<Product>;

    /// Atomically decrement `id`'s stock by `quantity` if at least that much is
    /// available. Returns the product as it is after the decrement. A quantity
    /// below one is a validation error.
    async fn reserve_stock(&self, id: Uuid, quantity: i32) -> AppResult<Product>;

    /// Reserve every line or none of them. Lines are checked in order and the
    /// first failing line is reported. Returns one product per line, in line
    /// order.
    async fn reserve_lines(&self, lines: &[CartLineInput]) -> AppResult<Vec<Product>>;

    /// Give back quantities taken by a successful `reserve_lines`.
    async fn release_lines(&self, lines: &[CartLineInput]) -> AppResult<()>;
}

/// Durable order records.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> AppResult<Order>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Order>>;

    /// Orders newest first, optionally restricted to one status.
    async fn list(&self, status: Option<OrderStatus>) -> AppResult<Vec<Order>>;

    /// Move the order from `from` to `to` and bump `updated_at`, but only if
    /// its status is still `from`. `None` if the order does not exist or its
    /// status has changed since it was read.
    async fn update_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> AppResult<Option<Order>>;
}
