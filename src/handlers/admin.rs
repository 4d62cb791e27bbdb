//! Back-office order management: listing, lookup and status changes.

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderStatus};
use crate::AppState;

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(AppError::Validation)
}

/// Orders newest first. A blank filter means no filter.
pub async fn list_orders(state: &AppState, status: Option<&str>) -> AppResult<Vec<Order>> {
    let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_status(raw)?),
        None => None,
    };
    state.orders.list(status).await
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<Order> {
    state
        .orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::order_not_found(id))
}

const STATUS_UPDATE_ATTEMPTS: usize = 3;

/// Change an order's status. Only `status` and `updated_at` are written; the
/// configured [`crate::models::StatusPolicy`] decides which moves are legal.
///
/// The write only lands if the order still has the status the policy was
/// checked against. When a concurrent update wins, the move is re-checked
/// against the status it wrote.
pub async fn set_status(state: &AppState, id: Uuid, status: &str) -> AppResult<Order> {
    let next = parse_status(status)?;
    let mut current = get_order(state, id).await?;

    for _ in 0..STATUS_UPDATE_ATTEMPTS {
        if !state.status_policy.allows(current.status, next) {
            return Err(AppError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }

        if let Some(updated) = state.orders.update_status(id, current.status, next).await? {
            info!(
                "Order {} status changed from {} to {}",
                updated.order_number, current.status, updated.status
            );
            return Ok(updated);
        }

        current = get_order(state, id).await?;
    }

    warn!(
        "Order {} kept changing status, giving up on move to {}",
        current.order_number, next
    );
    Err(AppError::InvalidTransition {
        from: current.status,
        to: next,
    })
}
