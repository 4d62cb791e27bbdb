//! Admin order management routes. Every route requires a bearer token.
//!
//! GET /api/admin/orders?status= - List orders newest first, optionally by status
//! GET /api/admin/orders/{id}    - Retrieve one order
//! PUT /api/admin/orders/{id}    - Change an order's status

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query};
use axum::middleware;
use axum::routing::get;
use axum::{Extension, Json, Router};
use uuid::Uuid;

use crate::auth::require_admin;
use crate::error::{AppError, AppResult};
use crate::handlers::admin;
use crate::models::{ListOrdersQuery, OrderListResponse, OrderResponse, UpdateStatusRequest};
use crate::AppState;

/// Build the admin router. The auth layer reads `AppState` from request
/// extensions, so the state extension must be layered outside this router.
pub fn router() -> Router {
    Router::new()
        .route("/api/admin/orders", get(list_orders))
        .route("/api/admin/orders/{id}", get(get_order).put(update_status))
        .route_layer(middleware::from_fn(require_admin))
}

async fn list_orders(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<OrderListResponse>> {
    let orders = admin::list_orders(&state, query.status.as_deref()).await?;
    Ok(Json(OrderListResponse {
        success: true,
        orders,
    }))
}

async fn get_order(
    Extension(state): Extension<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<OrderResponse>> {
    let Path(id) = id.map_err(|e| AppError::Validation(e.body_text()))?;
    let order = admin::get_order(&state, id).await?;
    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

async fn update_status(
    Extension(state): Extension<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> AppResult<Json<OrderResponse>> {
    let Path(id) = id.map_err(|e| AppError::Validation(e.body_text()))?;
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let order = admin::set_status(&state, id, &req.status).await?;
    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}
