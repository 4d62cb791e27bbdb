//! Postgres-backed stores.
//!
//! Stock is only ever changed by guarded `UPDATE ... WHERE stock >= $n`
//! statements, so a reservation can never drive stock below zero even if two
//! requests race for the last unit.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{check_lines, check_quantity, InventoryStore, OrderStore};
use crate::error::{AppError, AppResult};
use crate::models::{CartLineInput, Order, OrderStatus, Product};

#[derive(Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn insert_product(&self, product: Product) -> AppResult<Product> {
        product.validate().map_err(AppError::Validation)?;
        let stored = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (id, name, description, price, original_price, category, images, stock, weight, featured, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.price)
        .bind(&product.original_price)
        .bind(product.category)
        .bind(&product.images)
        .bind(product.stock)
        .bind(&product.weight)
        .bind(product.featured)
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn reserve_stock(&self, id: Uuid, quantity: i32) -> AppResult<Product> {
        check_quantity(quantity, id)?;
        let reserved = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET stock = stock - $1, updated_at = NOW()
            WHERE id = $2 AND $1 > 0 AND stock >= $1
            RETURNING *
            "#,
        )
        .bind(quantity)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(product) = reserved {
            return Ok(product);
        }

        // Nothing updated: tell a missing product apart from a short one.
        match self.get_product(id).await? {
            Some(product) => Err(AppError::InsufficientStock {
                product_name: product.name,
            }),
            None => Err(AppError::product_not_found(id)),
        }
    }

    async fn reserve_lines(&self, lines: &[CartLineInput]) -> AppResult<Vec<Product>> {
        check_lines(lines)?;
        let mut tx = self.pool.begin().await?;

        // Lock every referenced row in id order so concurrent multi-line carts
        // cannot deadlock against each other.
        let ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
        let locked: Vec<Product> = sqlx::query_as(
            "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;
        let mut available: HashMap<Uuid, (String, i32)> = locked
            .into_iter()
            .map(|p| (p.id, (p.name, p.stock)))
            .collect();

        // Returning early drops `tx`, which rolls the transaction back.
        for line in lines {
            let (name, stock) = available
                .get_mut(&line.product_id)
                .ok_or_else(|| AppError::product_not_found(line.display_name()))?;
            if *stock < line.quantity {
                return Err(AppError::InsufficientStock {
                    product_name: name.clone(),
                });
            }
            *stock -= line.quantity;
        }

        let mut reserved = Vec::with_capacity(lines.len());
        for line in lines {
            let product: Option<Product> = sqlx::query_as(
                r#"
                UPDATE products
                SET stock = stock - $1, updated_at = NOW()
                WHERE id = $2 AND $1 > 0 AND stock >= $1
                RETURNING *
                "#,
            )
            .bind(line.quantity)
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await?;
            let product = product.ok_or_else(|| {
                AppError::Persistence(format!(
                    "stock for product {} changed while locked",
                    line.product_id
                ))
            })?;
            reserved.push(product);
        }

        tx.commit().await?;
        debug!("Reserved stock for {} cart lines", lines.len());
        Ok(reserved)
    }

    async fn release_lines(&self, lines: &[CartLineInput]) -> AppResult<()> {
        check_lines(lines)?;
        let mut tx = self.pool.begin().await?;
        for line in lines {
            let result = sqlx::query(
                "UPDATE products SET stock = stock + $1, updated_at = NOW() WHERE id = $2 AND $1 > 0",
            )
            .bind(line.quantity)
            .bind(line.product_id)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                warn!("Product {} vanished before its stock could be released", line.product_id);
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: Order) -> AppResult<Order> {
        let stored = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders
                (id, order_number, items, customer, total_amount, payment_method, status, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(Json(&order.items))
        .bind(Json(&order.customer))
        .bind(&order.total_amount)
        .bind(order.payment_method)
        .bind(order.status)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn list(&self, status: Option<OrderStatus>) -> AppResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE $1::order_status IS NULL OR status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn update_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(to)
        .bind(id)
        .bind(from)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }
}
