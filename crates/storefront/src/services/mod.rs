//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Sign-up and password sign-in
//! - `catalog` - Product listing, search, filters and the built-in demo catalog
//! - `cart` - Cart reconciliation between the session and `cart_item` rows
//! - `wishlist` - Wishlist reconciliation for guests and signed-in shoppers
//! - `checkout` - Order placement
//! - `payments` - UPI links and payment screenshots
//! - `whatsapp` - `wa.me` hand-off messages
//! - `toast` - `HX-Trigger` notifications

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod payments;
pub mod toast;
pub mod whatsapp;
pub mod wishlist;
