//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod phone;
pub mod product_key;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use phone::{Phone, PhoneError};
pub use product_key::{DEMO_PREFIX, ProductKey, ProductKeyError};
pub use status::*;
