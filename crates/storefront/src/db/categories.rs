//! Category repository.
//!
//! Categories are soft-deleted so products keep their category text.

use sqlx::PgPool;

use akf_core::CategoryId;

use super::RepositoryError;
use crate::models::Category;

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active categories in alphabetical order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name
            FROM storefront.category
            WHERE is_active
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Add a category, reviving it if it was deleted earlier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an active category has this name.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, name: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO storefront.category (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET is_active = TRUE
            WHERE NOT storefront.category.is_active
            RETURNING id, name
            ",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        row.map(Category::from)
            .ok_or_else(|| RepositoryError::Conflict(format!("category {name} already exists")))
    }

    /// Hide a category from the storefront and the admin form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active category has this ID.
    pub async fn deactivate(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.category
            SET is_active = FALSE
            WHERE id = $1 AND is_active
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
