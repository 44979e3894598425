//! Remote wishlist rows for signed-in users.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use akf_core::{Money, ProductId, ProductKey, UserId, WishlistItemId};

use super::RepositoryError;
use crate::models::{ProductSummary, WishlistLine};

#[derive(sqlx::FromRow)]
struct WishlistRow {
    id: WishlistItemId,
    product_id: ProductId,
    name: String,
    price: Money,
    original_price: Option<Money>,
    image_url: Option<String>,
    category: String,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

impl From<WishlistRow> for WishlistLine {
    fn from(row: WishlistRow) -> Self {
        Self {
            id: row.id.to_string(),
            product: ProductSummary {
                key: ProductKey::Catalog(row.product_id),
                name: row.name,
                price: row.price,
                original_price: row.original_price,
                image_url: row.image_url,
                category: row.category,
                is_featured: row.is_featured,
                created_at: Some(row.created_at),
            },
            color_variant: None,
        }
    }
}

pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's saved products, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<WishlistLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            r"
            SELECT w.id, p.id AS product_id, p.name, p.price, p.original_price,
                   p.image_url, p.category, p.is_featured, p.created_at
            FROM storefront.wishlist_item w
            JOIN storefront.product p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(WishlistLine::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product is already saved.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.wishlist_item (user_id, product_id)
            VALUES ($1, $2)
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "wishlist item"))?;

        Ok(())
    }

    /// Remove every line of `product_id` for the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM storefront.wishlist_item
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
