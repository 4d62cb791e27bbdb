//! Database and catalog bootstrap helpers.
//!
//! Provides the Postgres pool type, connection and migration helpers, and the
//! seed-file loader used to fill an in-memory catalog.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::models::{NewProduct, Product};
use crate::store::InventoryStore;

/// Type alias for the application database pool.
pub type AppDb = PgPool;

/// Open the pool described by `config`.
pub async fn connect(config: &AppConfig) -> Result<AppDb, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

/// Apply the schema migrations under `migrations/`.
pub async fn migrate(pool: &AppDb) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Parse a JSON array of product definitions.
pub fn parse_seed(json: &str) -> serde_json::Result<Vec<Product>> {
    let products: Vec<NewProduct> = serde_json::from_str(json)?;
    Ok(products.into_iter().map(NewProduct::into_product).collect())
}

/// Insert every product, stopping at the first invalid one.
pub async fn seed_inventory(inventory: &dyn InventoryStore, products: Vec<Product>) -> AppResult<usize> {
    let count = products.len();
    for product in products {
        info!("Seeding product {} ({} in stock)", product.name, product.stock);
        inventory.insert_product(product).await?;
    }
    Ok(count)
}
