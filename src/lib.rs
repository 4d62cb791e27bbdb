//! # Storefront Orders
//!
//! Order intake and admin order management for a cash-on-delivery storefront.
//! Exposes the Axum router and shared state so integration tests can host the
//! service in-process without a database.

pub mod auth;
pub mod cart;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod money;
pub mod notifications;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::TokenVerifier;
use crate::handlers::intake::OrderNumberGenerator;
use crate::models::StatusPolicy;
use crate::notifications::NotificationDispatcher;
use crate::store::{InventoryStore, OrderStore};

/// Everything a request handler needs. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<dyn InventoryStore>,
    pub orders: Arc<dyn OrderStore>,
    pub notifier: NotificationDispatcher,
    pub verifier: Arc<dyn TokenVerifier>,
    pub status_policy: StatusPolicy,
    pub order_numbers: Arc<OrderNumberGenerator>,
}

impl AppState {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        orders: Arc<dyn OrderStore>,
        notifier: NotificationDispatcher,
        verifier: Arc<dyn TokenVerifier>,
        status_policy: StatusPolicy,
    ) -> Self {
        Self {
            inventory,
            orders,
            notifier,
            verifier,
            status_policy,
            order_numbers: Arc::new(OrderNumberGenerator::new()),
        }
    }

    /// State with no notification sinks and a fixed admin token. Must be
    /// called inside a Tokio runtime.
    #[cfg(test)]
    pub(crate) fn for_tests(inventory: Arc<dyn InventoryStore>, orders: Arc<dyn OrderStore>) -> Self {
        let (notifier, worker) =
            NotificationDispatcher::new(64, Vec::new(), std::time::Duration::from_secs(1));
        tokio::spawn(worker.run());
        Self::new(
            inventory,
            orders,
            notifier,
            Arc::new(auth::StaticTokenVerifier::new("test-admin-token")),
            StatusPolicy::Permissive,
        )
    }
}

/// Build the Axum router with all route modules and middleware.
///
/// The caller is responsible for building the state, including spawning the
/// notification worker. This function does NOT start a server.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::orders::router())
        .merge(routes::products::router())
        .merge(routes::admin::router())
        .merge(routes::health::router())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
