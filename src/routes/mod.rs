//! HTTP route modules.
//!
//! - `orders`: customer checkout
//! - `products`: single product lookup
//! - `admin`: bearer-protected order back office
//! - `health`: liveness check

pub mod admin;
pub mod health;
pub mod orders;
pub mod products;
