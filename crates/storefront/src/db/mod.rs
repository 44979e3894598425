//! Database operations for the storefront `PostgreSQL` schema.
//!
//! # Schema: `storefront`
//!
//! ## Tables
//!
//! - `app_user`, `profile`, `user_role` - Accounts, contact details, admin grants
//! - `saved_address` - Delivery addresses per account
//! - `category`, `product`, `product_color`, `product_size`, `product_image` - Catalog
//! - `cart_item` - Remote cart lines keyed by the visitor's cart ID
//! - `wishlist_item` - Saved products per account
//! - `customer_order`, `order_item` - Placed orders with price snapshots
//! - `notify_request` - Back-in-stock requests
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p akf-cli -- migrate
//! ```

pub mod addresses;
pub mod carts;
pub mod categories;
pub mod notify;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod users;
pub mod wishlists;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use notify::NotifyRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use profiles::ProfileRepository;
pub use users::UserRepository;
pub use wishlists::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value no longer passes domain validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The requested row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_insert(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// Convert a stored count into `u32`, rejecting negatives.
pub(crate) fn to_u32(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}

/// Convert a quantity into the `INTEGER` column type.
pub(crate) fn to_i32(value: u32) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("quantity out of range: {value}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_u32_rejects_negative() {
        assert_eq!(to_u32(3, "stock").ok(), Some(3));
        assert!(matches!(
            to_u32(-1, "stock"),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_conflict_display() {
        let err = RepositoryError::Conflict("email already exists".to_string());
        assert_eq!(err.to_string(), "conflict: email already exists");
    }
}
