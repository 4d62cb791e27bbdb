//! # Storefront Orders
//!
//! Cash-on-delivery order intake with atomic inventory reservation, plus the
//! admin back office for order status management.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and request/response lifecycle
//! - SQLx manages products and orders in Postgres (or an in-memory store for demos)
//! - A background notification worker delivers new-order alerts best-effort

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use storefront_orders::auth::StaticTokenVerifier;
use storefront_orders::config::{AppConfig, StorageBackend};
use storefront_orders::notifications::{LogSink, NotificationDispatcher, NotificationSink, WhatsAppSink};
use storefront_orders::store::{
    InventoryStore, MemoryInventoryStore, MemoryOrderStore, OrderStore, PgInventoryStore, PgOrderStore,
};
use storefront_orders::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_orders=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting storefront order service");

    let config = AppConfig::from_env()?;

    let (inventory, orders): (Arc<dyn InventoryStore>, Arc<dyn OrderStore>) = match config.storage {
        StorageBackend::Postgres => {
            let pool = db::connect(&config).await?;
            info!("Connected to application database");

            db::migrate(&pool).await?;
            info!("Application migrations complete");

            if config.seed_file.is_some() {
                warn!("SEED_FILE is only applied to the memory backend; ignoring");
            }
            let inventory: Arc<dyn InventoryStore> = Arc::new(PgInventoryStore::new(&pool));
            let orders: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(&pool));
            (inventory, orders)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; orders are lost on restart");
            let inventory: Arc<dyn InventoryStore> = Arc::new(MemoryInventoryStore::new());
            if let Some(path) = &config.seed_file {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading seed file {}", path.display()))?;
                let products = db::parse_seed(&raw).context("parsing seed file")?;
                let count = db::seed_inventory(inventory.as_ref(), products).await?;
                info!("Seeded {} products", count);
            }
            let orders: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
            (inventory, orders)
        }
    };

    // Notification sinks: always log, message the shop owner when configured.
    let mut sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(LogSink)];
    match config.whatsapp.clone() {
        Some(whatsapp) => sinks.push(Arc::new(WhatsAppSink::new(whatsapp))),
        None => info!("WhatsApp not configured, skipping messaging notifications"),
    }
    let (notifier, worker) = NotificationDispatcher::new(
        config.notification_queue_capacity,
        sinks,
        config.notification_timeout,
    );
    tokio::spawn(worker.run());
    info!("Notification worker started");

    let state = AppState::new(
        inventory,
        orders,
        notifier,
        Arc::new(StaticTokenVerifier::new(config.admin_token.clone())),
        config.status_policy,
    );
    info!("Order status policy: {:?}", config.status_policy);

    let app = create_app(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
