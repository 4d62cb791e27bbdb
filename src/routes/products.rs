//! Product lookup.
//!
//! GET /api/products/{id} - Retrieve a product with its current stock

use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::routing::get;
use axum::{Extension, Json, Router};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::ProductResponse;
use crate::AppState;

pub fn router() -> Router {
    Router::new().route("/api/products/{id}", get(get_product))
}

async fn get_product(
    Extension(state): Extension<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ProductResponse>> {
    let Path(id) = id.map_err(|e| AppError::Validation(e.body_text()))?;
    let product = state
        .inventory
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}
