//! AK Fashion Hub Core - Shared domain types.
//!
//! This crate provides the types used across the storefront components:
//! - `storefront` - Public shop, account pages and the `/admin` panel
//! - `cli` - Command-line tools for migrations, admin roles and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, phones, product keys and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
