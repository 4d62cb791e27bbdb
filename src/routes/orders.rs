//! Customer checkout routes.
//!
//! POST /api/orders - Validate the cart, reserve stock and create a pending COD order

use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Extension, Json, Router};

use crate::error::{AppError, AppResult};
use crate::handlers::intake;
use crate::models::{PlaceOrderRequest, PlaceOrderResponse};
use crate::AppState;

/// Build the orders router.
pub fn router() -> Router {
    Router::new().route("/api/orders", post(create_order))
}

/// Place an order.
///
/// Responds 404 when a product is missing, 400 for short stock or a malformed
/// request and 500 when the order cannot be stored.
async fn create_order(
    Extension(state): Extension<AppState>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> AppResult<Json<PlaceOrderResponse>> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let order = intake::place_order(&state, req).await?;

    Ok(Json(PlaceOrderResponse {
        success: true,
        order,
    }))
}
