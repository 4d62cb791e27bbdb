//! Shopping cart owned by a client session.
//!
//! The cart is a plain value: the session holds it and passes its lines to
//! order placement explicitly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CartLineInput, Product};
use crate::money::{self, BigDecimal};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    #[serde(with = "money::amount")]
    pub price: BigDecimal,
    pub image: String,
    pub weight: String,
    pub quantity: i32,
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price.clone(),
            image: product.primary_image().to_string(),
            weight: product.weight.clone(),
            quantity: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of `product`, merging with an existing line.
    pub fn add_item(&mut self, product: &Product) {
        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
            None => self.items.push(CartItem::from(product)),
        }
    }

    pub fn remove_item(&mut self, product_id: Uuid) {
        self.items.retain(|i| i.product_id != product_id);
    }

    /// Set a line's quantity; zero or less removes the line.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i32) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total_items(&self) -> i32 {
        self.items.iter().fold(0, |total, i| total.saturating_add(i.quantity))
    }

    /// Display total at cart prices. The order total is recomputed from live
    /// prices at placement time.
    pub fn total_price(&self) -> BigDecimal {
        self.items
            .iter()
            .map(|i| &i.price * &BigDecimal::from(i.quantity))
            .sum()
    }

    pub fn to_order_lines(&self) -> Vec<CartLineInput> {
        self.items
            .iter()
            .map(|i| CartLineInput {
                product_id: i.product_id,
                quantity: i.quantity,
                name: Some(i.name.clone()),
            })
            .collect()
    }
}
