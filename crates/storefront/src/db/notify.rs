//! Back-in-stock requests.

use sqlx::PgPool;

use akf_core::{Email, NotifyRequestId};

use super::RepositoryError;

pub struct NotifyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotifyRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record that `email` wants to hear when a product is back.
    ///
    /// `product_id` is a catalog UUID or a demo slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        product_id: &str,
        email: &Email,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<NotifyRequestId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO storefront.notify_request (product_id, email, size, color)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(product_id)
        .bind(email.as_str())
        .bind(size)
        .bind(color)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}
