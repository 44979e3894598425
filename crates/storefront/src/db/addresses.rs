//! Saved delivery addresses.
//!
//! At most one address per user is the default. The first address a user
//! saves becomes the default.

use sqlx::PgPool;

use akf_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{NewAddress, SavedAddress};

const ADDRESS_COLUMNS: &str = r"
    id, user_id, label, full_name, phone, address_line1, address_line2,
    city, state, pincode, is_default
";

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: String,
    full_name: String,
    phone: String,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    state: String,
    pincode: String,
    is_default: bool,
}

impl From<AddressRow> for SavedAddress {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            full_name: row.full_name,
            phone: row.phone,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            is_default: row.is_default,
        }
    }
}

pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<SavedAddress>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.saved_address
             WHERE user_id = $1
             ORDER BY is_default DESC, created_at"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(SavedAddress::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn default_for(&self, user_id: UserId) -> Result<Option<SavedAddress>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.saved_address
             WHERE user_id = $1 AND is_default
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(SavedAddress::from))
    }

    /// Save an address; it becomes the default if the user has none yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<SavedAddress, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO storefront.saved_address
                (user_id, label, full_name, phone, address_line1, address_line2,
                 city, state, pincode, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9,
                     NOT EXISTS (SELECT 1 FROM storefront.saved_address WHERE user_id = $1))
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&address.label)
        .bind(&address.full_name)
        .bind(&address.phone)
        .bind(&address.address_line1)
        .bind(&address.address_line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.pincode)
        .fetch_one(self.pool)
        .await?;

        Ok(SavedAddress::from(row))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.saved_address WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Make `id` the user's only default address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address;
    /// the previous default is kept in that case.
    pub async fn set_default(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE storefront.saved_address SET is_default = FALSE WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "UPDATE storefront.saved_address SET is_default = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
