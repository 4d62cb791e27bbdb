//! # Order Intake
//!
//! Turns a submitted cart into a durable order.
//!
//! ## Steps
//!
//! 1. **validate**: non-empty cart, positive quantities, complete customer record
//! 2. **reserve**: check and decrement stock for every line, all or nothing
//! 3. **price**: snapshot name, image and unit price per line and sum the total
//! 4. **persist**: store a `Pending` order under a fresh order number, releasing
//!    the reservation if the write fails
//! 5. **notify**: queue the order for the notification worker and return

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    order_total, Order, OrderConfirmation, OrderItem, OrderStatus, PaymentMethod, PlaceOrderRequest,
};
use crate::notifications::OrderNotification;
use crate::AppState;

/// Issues order numbers of the form `ORD{millis}{hex}`.
///
/// The millisecond part never repeats or goes backwards within a process; the
/// random suffix and the database unique index cover multiple processes.
#[derive(Debug, Default)]
pub struct OrderNumberGenerator {
    last_millis: AtomicI64,
}

impl OrderNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = match self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        {
            Ok(previous) | Err(previous) => previous,
        };
        let millis = now.max(previous + 1);
        let suffix = Uuid::new_v4().simple().to_string()[..4].to_uppercase();
        format!("ORD{}{}", millis, suffix)
    }
}

fn validate_request(req: &PlaceOrderRequest) -> AppResult<()> {
    if req.items.is_empty() {
        return Err(AppError::Validation("Cart cannot be empty".to_string()));
    }
    for line in &req.items {
        if line.quantity < 1 {
            return Err(AppError::Validation(format!(
                "Invalid quantity {} for {}",
                line.quantity,
                line.display_name()
            )));
        }
    }
    req.customer.validate().map_err(AppError::Validation)
}

/// Place an order for the given cart.
///
/// On any failure before the order is stored, no stock has been taken. The
/// notification outcome never affects the result.
pub async fn place_order(state: &AppState, req: PlaceOrderRequest) -> AppResult<OrderConfirmation> {
    validate_request(&req)?;

    let reserved = state.inventory.reserve_lines(&req.items).await.map_err(|e| {
        warn!("Order rejected for {}: {}", req.customer.email, e);
        e
    })?;

    let items: Vec<OrderItem> = req
        .items
        .iter()
        .zip(&reserved)
        .map(|(line, product)| OrderItem {
            product: product.id,
            product_name: product.name.clone(),
            product_image: product.primary_image().to_string(),
            quantity: line.quantity,
            price: product.price.clone(),
        })
        .collect();
    let total_amount = order_total(&items);

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        order_number: state.order_numbers.next(),
        items,
        customer: req.customer,
        total_amount,
        payment_method: PaymentMethod::CashOnDelivery,
        status: OrderStatus::Pending,
        notes: req.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        created_at: now,
        updated_at: now,
    };

    let order = match state.orders.insert(order).await {
        Ok(order) => order,
        Err(e) => {
            error!("Failed to store order, releasing reserved stock: {}", e);
            if let Err(release_err) = state.inventory.release_lines(&req.items).await {
                error!("Failed to release reserved stock: {}", release_err);
            }
            return Err(e);
        }
    };

    info!(
        "Order {} placed for {} (total: {})",
        order.order_number, order.customer.email, order.total_amount
    );

    state.notifier.dispatch(OrderNotification::from(&order));

    Ok(OrderConfirmation {
        order_number: order.order_number,
        total_amount: order.total_amount,
        status: order.status,
    })
}
