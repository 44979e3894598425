//! Product repository: catalog reads for the storefront and writes for the
//! admin panel.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use akf_core::{ColorId, Money, ProductId, ProductKey, SizeId};

use super::{RepositoryError, to_i32, to_u32};
use crate::models::{Product, ProductColor, ProductDraft, ProductSize, ProductSummary};

const PRODUCT_COLUMNS: &str = r"
    id, name, description, price, original_price, category, image_url,
    stock_quantity, is_active, is_featured, created_at
";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Money,
    original_price: Option<Money>,
    category: String,
    image_url: Option<String>,
    stock_quantity: i32,
    is_active: bool,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            summary: ProductSummary {
                key: ProductKey::Catalog(row.id),
                name: row.name,
                price: row.price,
                original_price: row.original_price,
                image_url: row.image_url,
                category: row.category,
                is_featured: row.is_featured,
                created_at: Some(row.created_at),
            },
            description: row.description,
            stock_quantity: to_u32(row.stock_quantity, "stock_quantity")?,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ColorRow {
    id: ColorId,
    name: String,
    hex_code: String,
}

#[derive(sqlx::FromRow)]
struct SizeRow {
    id: SizeId,
    size: String,
    stock_quantity: i32,
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

fn into_summaries(rows: Vec<ProductRow>) -> Result<Vec<ProductSummary>, RepositoryError> {
    rows.into_iter()
        .map(|row| Product::try_from(row).map(|p| p.summary))
        .collect()
}

/// Build an `ILIKE` pattern matching `query` anywhere, with wildcards escaped.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<ProductSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product
             WHERE is_active ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        into_summaries(rows)
    }

    /// Active products whose name contains `query`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_active(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product
             WHERE is_active AND name ILIKE $1
             ORDER BY created_at DESC
             LIMIT $2"
        ))
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_summaries(rows)
    }

    /// Active products among `ids`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product
             WHERE is_active AND id = ANY($1)"
        ))
        .bind(uuids)
        .fetch_all(self.pool)
        .await?;

        into_summaries(rows)
    }

    /// An active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product
             WHERE id = $1 AND is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    /// A product by ID regardless of its active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn colors(&self, id: ProductId) -> Result<Vec<ProductColor>, RepositoryError> {
        let rows = sqlx::query_as::<_, ColorRow>(
            r"
            SELECT id, name, hex_code
            FROM storefront.product_color
            WHERE product_id = $1
            ORDER BY name
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ProductColor {
                id: r.id,
                name: r.name,
                hex_code: r.hex_code,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stock count is negative.
    pub async fn sizes(&self, id: ProductId) -> Result<Vec<ProductSize>, RepositoryError> {
        let rows = sqlx::query_as::<_, SizeRow>(
            r"
            SELECT id, size, stock_quantity
            FROM storefront.product_size
            WHERE product_id = $1
            ORDER BY size
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(ProductSize {
                    id: r.id,
                    size: r.size,
                    stock_quantity: to_u32(r.stock_quantity, "size stock")?,
                })
            })
            .collect()
    }

    /// Gallery image URLs in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images(&self, id: ProductId) -> Result<Vec<String>, RepositoryError> {
        let urls = sqlx::query_scalar(
            r"
            SELECT image_url
            FROM storefront.product_image
            WHERE product_id = $1
            ORDER BY sort_order
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(urls)
    }

    /// Other active products in the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        id: ProductId,
        category: &str,
        limit: i64,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product
             WHERE is_active AND category = $1 AND id <> $2
             ORDER BY created_at DESC
             LIMIT $3"
        ))
        .bind(category)
        .bind(id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_summaries(rows)
    }

    /// Every product, newest first, for the admin table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a product with its sizes, colours and gallery images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// written in that case.
    pub async fn create(&self, draft: &ProductDraft) -> Result<ProductId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.product
                (name, description, price, original_price, category, image_url,
                 stock_quantity, is_active, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.original_price)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(to_i32(draft.stock_quantity())?)
        .bind(draft.is_active)
        .bind(draft.is_featured)
        .fetch_one(&mut *tx)
        .await?;

        insert_children(&mut tx, id, draft).await?;
        tx.commit().await?;

        Ok(id)
    }

    /// Overwrite a product and replace its sizes, colours and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn update(&self, id: ProductId, draft: &ProductDraft) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE storefront.product
            SET name = $2, description = $3, price = $4, original_price = $5,
                category = $6, image_url = $7, stock_quantity = $8,
                is_active = $9, is_featured = $10, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.original_price)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(to_i32(draft.stock_quantity())?)
        .bind(draft.is_active)
        .bind(draft.is_featured)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        for table in ["product_size", "product_color", "product_image"] {
            sqlx::query(&format!(
                "DELETE FROM storefront.{table} WHERE product_id = $1"
            ))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        insert_children(&mut tx, id, draft).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Delete a product; its variants, images and cart rows go with it.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_children(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    draft: &ProductDraft,
) -> Result<(), RepositoryError> {
    for size in &draft.sizes {
        sqlx::query(
            r"
            INSERT INTO storefront.product_size (product_id, size, stock_quantity)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(id)
        .bind(&size.size)
        .bind(to_i32(size.stock_quantity)?)
        .execute(&mut **tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "size"))?;
    }

    for color in &draft.colors {
        sqlx::query(
            r"
            INSERT INTO storefront.product_color (product_id, name, hex_code)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(id)
        .bind(&color.name)
        .bind(&color.hex_code)
        .execute(&mut **tx)
        .await?;
    }

    for (position, url) in draft.images.iter().enumerate() {
        let sort_order = i32::try_from(position).unwrap_or(i32::MAX);
        sqlx::query(
            r"
            INSERT INTO storefront.product_image (product_id, image_url, sort_order)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(id)
        .bind(url)
        .bind(sort_order)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("silk"), "%silk%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
