//! Domain models for the storefront.
//!
//! `Product` and `Order` map to the `products` and `orders` tables; line items
//! and the customer record are stored as JSONB documents on the order row.
//! All JSON exchanged with clients uses camelCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{self, BigDecimal};

// ============================================================================
// Catalog
// ============================================================================

/// Fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category")]
pub enum Category {
    Plain,
    Flavored,
    Premium,
    #[serde(rename = "Gift Pack")]
    #[sqlx(rename = "Gift Pack")]
    GiftPack,
}

/// A catalog entry and its inventory unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "money::amount")]
    pub price: BigDecimal,
    #[serde(default, with = "money::optional_amount")]
    pub original_price: Option<BigDecimal>,
    pub category: Category,
    pub images: Vec<String>,
    pub stock: i32,
    pub weight: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Image captured on order line items.
    pub fn primary_image(&self) -> &str {
        self.images.first().map(String::as_str).unwrap_or_default()
    }

    /// Check the catalog invariants before a product is stored.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name is required".to_string());
        }
        if self.price < money::zero() || !money::is_whole_cents(&self.price) {
            return Err(format!("Invalid price {} for {}", self.price, self.name));
        }
        if let Some(original) = &self.original_price {
            if *original < money::zero() || !money::is_whole_cents(original) {
                return Err(format!("Invalid original price {} for {}", original, self.name));
            }
        }
        if self.images.is_empty() {
            return Err("At least one image is required".to_string());
        }
        if self.stock < 0 {
            return Err(format!("Stock for {} cannot be negative", self.name));
        }
        Ok(())
    }
}

/// Product definition as it appears in a seed file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub description: String,
    #[serde(with = "money::amount")]
    pub price: BigDecimal,
    #[serde(default, with = "money::optional_amount")]
    pub original_price: Option<BigDecimal>,
    pub category: Category,
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: i32,
    pub weight: String,
    #[serde(default)]
    pub featured: bool,
}

impl NewProduct {
    pub fn into_product(self) -> Product {
        let now = Utc::now();
        Product {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name,
            description: self.description,
            price: self.price,
            original_price: self.original_price,
            category: self.category,
            images: self.images,
            stock: self.stock,
            weight: self.weight,
            featured: self.featured,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Order status. Which moves are allowed is decided by [`StatusPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Forward-only fulfillment moves. Re-setting the current status is allowed.
    fn advances_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if self == next {
            return true;
        }
        match self {
            Pending => true,
            Confirmed => matches!(next, Processing | Shipped | Delivered | Cancelled),
            Processing => matches!(next, Shipped | Delivered | Cancelled),
            Shipped => next == Delivered,
            Delivered | Cancelled => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown order status '{}'", s))
    }
}

/// How admin status updates are validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Any status can be set from any other status.
    #[default]
    Permissive,
    /// Only forward fulfillment moves; Delivered and Cancelled are terminal.
    Forward,
}

impl StatusPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            StatusPolicy::Permissive => true,
            StatusPolicy::Forward => from.advances_to(to),
        }
    }
}

impl std::str::FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(StatusPolicy::Permissive),
            "forward" => Ok(StatusPolicy::Forward),
            other => Err(format!("Unknown status policy '{}'", other)),
        }
    }
}

/// The only supported payment method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method")]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "COD")]
    #[sqlx(rename = "COD")]
    CashOnDelivery,
}

/// Customer contact and shipping record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl CustomerInfo {
    /// Every field is required and must not be blank.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("pincode", &self.pincode),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Customer {} is required", missing.join(", ")))
        }
    }
}

/// A line item snapshotted at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: Uuid,
    pub product_name: String,
    pub product_image: String,
    pub quantity: i32,
    #[serde(with = "money::amount")]
    pub price: BigDecimal,
}

impl OrderItem {
    pub fn line_total(&self) -> BigDecimal {
        &self.price * &BigDecimal::from(self.quantity)
    }
}

/// Exact sum of `price * quantity` over the items.
pub fn order_total(items: &[OrderItem]) -> BigDecimal {
    items.iter().map(OrderItem::line_total).sum()
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    #[sqlx(json)]
    pub items: Vec<OrderItem>,
    #[sqlx(json)]
    pub customer: CustomerInfo,
    #[serde(with = "money::amount")]
    pub total_amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Request Models (Deserialize from JSON input)
// ============================================================================

/// Request body for placing an order.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<CartLineInput>,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A single cart line in an order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    #[serde(alias = "_id")]
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub name: Option<String>,
}

impl CartLineInput {
    /// Label used in error messages when the product cannot be loaded.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.product_id.to_string())
    }
}

/// Query string for the admin order listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

/// Request body for an admin status update.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// ============================================================================
// Response Models
// ============================================================================

/// Summary returned to the customer after a successful order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_number: String,
    #[serde(with = "money::amount")]
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order: OrderConfirmation,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
}
