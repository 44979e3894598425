//! User repository for database operations.
//!
//! Accounts are email + password; the profile row is created alongside the
//! account and admin access is a row in `storefront.user_role`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use akf_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            email,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    id: UserId,
    email: String,
    created_at: DateTime<Utc>,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, created_at
            FROM storefront.app_user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, created_at
            FROM storefront.app_user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Create a new user with email and password, plus their profile row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        full_name: &str,
        phone: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront.app_user (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, created_at
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?;

        sqlx::query(
            r"
            INSERT INTO storefront.profile (user_id, full_name, phone)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(row.id)
        .bind(full_name)
        .bind(phone)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        User::try_from(row)
    }

    /// Get a user together with their password hash, for sign-in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, email, created_at, password_hash
            FROM storefront.app_user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => {
                let user = User::try_from(UserRow {
                    id: r.id,
                    email: r.email,
                    created_at: r.created_at,
                })?;
                Ok(Some((user, r.password_hash)))
            }
            None => Ok(None),
        }
    }

    /// Whether the user holds `role`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_role(&self, user_id: UserId, role: UserRole) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM storefront.user_role
                WHERE user_id = $1 AND role = $2
            )
            ",
        )
        .bind(user_id)
        .bind(role)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Grant `role` to the user. Granting twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn grant_role(&self, user_id: UserId, role: UserRole) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.user_role (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(role)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Revoke `role` from the user.
    ///
    /// Returns `true` if the user held the role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke_role(&self, user_id: UserId, role: UserRole) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.user_role
            WHERE user_id = $1 AND role = $2
            ",
        )
        .bind(user_id)
        .bind(role)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
