//! Profile repository: the name and phone kept alongside an account.

use sqlx::PgPool;

use akf_core::UserId;

use super::RepositoryError;
use crate::models::Profile;

#[derive(sqlx::FromRow)]
struct ProfileRow {
    full_name: Option<String>,
    phone: Option<String>,
}

/// Repository for profile rows.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the profile for a user, empty if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT full_name, phone
            FROM storefront.profile
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map_or_else(Profile::default, |r| Profile {
            full_name: r.full_name,
            phone: r.phone,
        }))
    }

    /// Save name and phone, creating the row if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        full_name: &str,
        phone: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.profile (user_id, full_name, phone)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                updated_at = now()
            ",
        )
        .bind(user_id)
        .bind(full_name)
        .bind(phone)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
