//! Remote cart rows keyed by the visitor's cart ID.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use akf_core::{CartId, CartItemId, Money, ProductId, ProductKey};

use super::{RepositoryError, to_i32, to_u32};
use crate::models::{CartLine, LineColor, LineOptions, ProductSummary};

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    quantity: i32,
    color_name: Option<String>,
    color_hex: Option<String>,
    color_image: Option<String>,
    size: Option<String>,
    product_id: ProductId,
    name: String,
    price: Money,
    original_price: Option<Money>,
    image_url: Option<String>,
    category: String,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let color = row.color_name.map(|name| LineColor {
            name,
            hex: row.color_hex,
            image: row.color_image,
        });
        Ok(Self {
            id: row.id,
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
            quantity: to_u32(row.quantity, "cart quantity")?,
            options: LineOptions {
                color,
                size: row.size,
            },
        })
    }
}

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Lines in a cart with their products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.id, c.quantity, c.color_name, c.color_hex, c.color_image, c.size,
                   p.id AS product_id, p.name, p.price, p.original_price, p.image_url,
                   p.category, p.is_featured, p.created_at
            FROM storefront.cart_item c
            JOIN storefront.product p ON p.id = c.product_id
            WHERE c.cart_id = $1
            ORDER BY c.created_at
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    /// Insert a single-unit line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        options: &LineOptions,
    ) -> Result<CartItemId, RepositoryError> {
        let color = options.color.as_ref();
        let id = sqlx::query_scalar(
            r"
            INSERT INTO storefront.cart_item
                (cart_id, product_id, quantity, color_name, color_hex, color_image, size)
            VALUES ($1, $2, 1, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(color.map(|c| c.name.as_str()))
        .bind(color.and_then(|c| c.hex.as_deref()))
        .bind(color.and_then(|c| c.image.as_deref()))
        .bind(options.size.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn set_quantity(
        &self,
        cart_id: CartId,
        id: CartItemId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.cart_item SET quantity = $3 WHERE id = $1 AND cart_id = $2",
        )
        .bind(id)
        .bind(cart_id)
        .bind(to_i32(quantity)?)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Lines of other carts are left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, cart_id: CartId, id: CartItemId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart_item WHERE id = $1 AND cart_id = $2")
            .bind(id)
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Remove every line in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart_item WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
