//! In-process stores guarded by `tokio::sync::Mutex`.
//!
//! Each operation holds its lock for its whole check-and-mutate sequence, which
//! gives the same per-operation atomicity the Postgres backend gets from row
//! locks.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{check_lines, check_quantity, InventoryStore, OrderStore};
use crate::error::{AppError, AppResult};
use crate::models::{CartLineInput, Order, OrderStatus, Product};

#[derive(Default)]
pub struct MemoryInventoryStore {
    products: Mutex<HashMap<Uuid, Product>>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: Mutex::new(products),
        }
    }

    /// Current stock for `id`, if the product exists.
    pub async fn stock_of(&self, id: Uuid) -> Option<i32> {
        self.products.lock().await.get(&id).map(|p| p.stock)
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.products.lock().await.get(&id).cloned())
    }

    async fn insert_product(&self, product: Product) -> AppResult<Product> {
        product.validate().map_err(AppError::Validation)?;
        let mut products = self.products.lock().await;
        if products.contains_key(&product.id) {
            return Err(AppError::Persistence(format!(
                "product {} already exists",
                product.id
            )));
        }
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn reserve_stock(&self, id: Uuid, quantity: i32) -> AppResult<Product> {
        check_quantity(quantity, id)?;
        let mut products = self.products.lock().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| AppError::product_not_found(id))?;
        if product.stock < quantity {
            return Err(AppError::InsufficientStock {
                product_name: product.name.clone(),
            });
        }
        product.stock -= quantity;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn reserve_lines(&self, lines: &[CartLineInput]) -> AppResult<Vec<Product>> {
        check_lines(lines)?;
        let mut products = self.products.lock().await;

        // Dry run against a scratch copy of the stock levels first.
        let mut remaining: HashMap<Uuid, i32> = HashMap::new();
        for line in lines {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| AppError::product_not_found(line.display_name()))?;
            let available = remaining.entry(product.id).or_insert(product.stock);
            if *available < line.quantity {
                return Err(AppError::InsufficientStock {
                    product_name: product.name.clone(),
                });
            }
            *available -= line.quantity;
        }

        let now = Utc::now();
        let mut reserved = Vec::with_capacity(lines.len());
        for line in lines {
            if let Some(product) = products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
                product.updated_at = now;
                reserved.push(product.clone());
            }
        }
        Ok(reserved)
    }

    async fn release_lines(&self, lines: &[CartLineInput]) -> AppResult<()> {
        check_lines(lines)?;
        let mut products = self.products.lock().await;
        let now = Utc::now();
        for line in lines {
            if let Some(product) = products.get_mut(&line.product_id) {
                product.stock += line.quantity;
                product.updated_at = now;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<Vec<Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.lock().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: Order) -> AppResult<Order> {
        let mut orders = self.orders.lock().await;
        if orders.iter().any(|o| o.order_number == order.order_number) {
            return Err(AppError::Persistence(format!(
                "duplicate order number {}",
                order.order_number
            )));
        }
        orders.push(order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.orders.lock().await.iter().find(|o| o.id == id).cloned())
    }

    async fn list(&self, status: Option<OrderStatus>) -> AppResult<Vec<Order>> {
        let orders = self.orders.lock().await;
        let mut matching: Vec<Order> = orders
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn update_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> AppResult<Option<Order>> {
        let mut orders = self.orders.lock().await;
        Ok(orders
            .iter_mut()
            .find(|o| o.id == id && o.status == from)
            .map(|order| {
                order.status = to;
                order.updated_at = Utc::now();
                order.clone()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NewProduct};
    use crate::money::BigDecimal;

    fn product(name: &str, stock: i32) -> Product {
        NewProduct {
            id: None,
            name: name.to_string(),
            description: format!("{} description", name),
            price: BigDecimal::from(100),
            original_price: None,
            category: Category::Plain,
            images: vec![format!("https://cdn.example.com/{}.jpg", name)],
            stock,
            weight: "250g".to_string(),
            featured: false,
        }
        .into_product()
    }

    fn line(product: &Product, quantity: i32) -> CartLineInput {
        CartLineInput {
            product_id: product.id,
            quantity,
            name: Some(product.name.clone()),
        }
    }

    #[tokio::test]
    async fn reserve_stock_refuses_to_go_negative() {
        let p = product("Plain", 2);
        let store = MemoryInventoryStore::with_products([p.clone()]);

        let after = store.reserve_stock(p.id, 2).await.unwrap();
        assert_eq!(after.stock, 0);

        let err = store.reserve_stock(p.id, 1).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));
        assert_eq!(store.stock_of(p.id).await, Some(0));
    }

    #[tokio::test]
    async fn failing_line_leaves_earlier_lines_untouched() {
        let a = product("A", 5);
        let b = product("B", 1);
        let store = MemoryInventoryStore::with_products([a.clone(), b.clone()]);

        let err = store
            .reserve_lines(&[line(&a, 2), line(&b, 3)])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for B");
        assert_eq!(store.stock_of(a.id).await, Some(5));
        assert_eq!(store.stock_of(b.id).await, Some(1));
    }

    #[tokio::test]
    async fn repeated_product_lines_count_against_the_same_stock() {
        let a = product("A", 3);
        let store = MemoryInventoryStore::with_products([a.clone()]);

        let err = store
            .reserve_lines(&[line(&a, 2), line(&a, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));
        assert_eq!(store.stock_of(a.id).await, Some(3));

        let reserved = store.reserve_lines(&[line(&a, 1), line(&a, 2)]).await.unwrap();
        assert_eq!(reserved.len(), 2);
        assert_eq!(store.stock_of(a.id).await, Some(0));

        store.release_lines(&[line(&a, 1), line(&a, 2)]).await.unwrap();
        assert_eq!(store.stock_of(a.id).await, Some(3));
    }

    #[tokio::test]
    async fn insert_product_rejects_invalid_catalog_entries() {
        let store = MemoryInventoryStore::new();
        let mut p = product("Broken", 1);
        p.images.clear();
        let err = store.insert_product(p).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn non_positive_quantities_never_add_stock() {
        let p = product("Plain", 7);
        let store = MemoryInventoryStore::with_products([p.clone()]);

        for quantity in [0, -50] {
            let err = store.reserve_stock(p.id, quantity).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));

            let err = store.reserve_lines(&[line(&p, quantity)]).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));

            let err = store.release_lines(&[line(&p, quantity)]).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(store.stock_of(p.id).await, Some(7));
    }

    #[tokio::test]
    async fn status_update_requires_expected_current_status() {
        let p = product("Plain", 1);
        let inventory = MemoryInventoryStore::with_products([p.clone()]);
        let reserved = inventory.reserve_stock(p.id, 1).await.unwrap();
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            order_number: "ORD1".into(),
            items: vec![crate::models::OrderItem {
                product: reserved.id,
                product_name: reserved.name.clone(),
                product_image: reserved.primary_image().to_string(),
                quantity: 1,
                price: reserved.price.clone(),
            }],
            customer: crate::models::CustomerInfo {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                phone: "9876543210".into(),
                address: "12 Lake Road".into(),
                city: "Patna".into(),
                state: "Bihar".into(),
                pincode: "800001".into(),
            },
            total_amount: reserved.price.clone(),
            payment_method: crate::models::PaymentMethod::CashOnDelivery,
            status: OrderStatus::Pending,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let orders = MemoryOrderStore::new();
        orders.insert(order.clone()).await.unwrap();

        let missed = orders
            .update_status(order.id, OrderStatus::Confirmed, OrderStatus::Shipped)
            .await
            .unwrap();
        assert!(missed.is_none());

        let moved = orders
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Shipped)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.status, OrderStatus::Shipped);
        assert_eq!(moved.items, order.items);
    }
}
