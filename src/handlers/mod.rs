//! Business operations behind the HTTP routes.
//!
//! - `intake`: order placement with atomic stock reservation
//! - `admin`: order listing, lookup and status transitions
//!
//! Handlers take the shared [`crate::AppState`] and return [`crate::error::AppResult`];
//! routes only translate between HTTP and these functions.

pub mod admin;
pub mod intake;
