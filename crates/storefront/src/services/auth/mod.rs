//! Authentication service.
//!
//! Email + password accounts hashed with Argon2id.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use akf_core::{Email, Phone, UserId, UserRole};

use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum length of a customer's full name.
const MIN_NAME_LENGTH: usize = 2;

/// Fields of the sign-up form.
#[derive(Debug, Clone, Copy)]
pub struct SignUp<'f> {
    pub email: &'f str,
    pub password: &'f str,
    pub full_name: &'f str,
    pub phone: &'f str,
}

/// A sign-up that passed validation.
#[derive(Debug)]
struct ValidSignUp {
    email: Email,
    full_name: String,
    phone: Phone,
}

impl SignUp<'_> {
    /// Check fields in form order, reporting the first problem.
    fn validate(&self) -> Result<ValidSignUp, AuthError> {
        let email = Email::parse(self.email)?;
        validate_password(self.password)?;
        let full_name = self.full_name.trim();
        if full_name.chars().count() < MIN_NAME_LENGTH {
            return Err(AuthError::InvalidName {
                min: MIN_NAME_LENGTH,
            });
        }
        let phone = Phone::parse(self.phone)?;
        Ok(ValidSignUp {
            email,
            full_name: full_name.to_owned(),
            phone,
        })
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer and create their profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `WeakPassword`, `InvalidName` or
    /// `InvalidPhone` for the first field that fails validation.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, form: SignUp<'_>) -> Result<User, AuthError> {
        let valid = form.validate()?;
        let password_hash = hash_password(form.password)?;

        let user = self
            .users
            .create_with_password(
                &valid.email,
                &password_hash,
                &valid.full_name,
                valid.phone.as_str(),
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Whether the user may open the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the role lookup fails.
    pub async fn is_admin(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.users.has_role(user_id, UserRole::Admin).await?)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form<'f>(password: &'f str, full_name: &'f str, phone: &'f str) -> SignUp<'f> {
        SignUp {
            email: "meera@example.com",
            password,
            full_name,
            phone,
        }
    }

    #[test]
    fn test_sign_up_accepts_valid_form() {
        let valid = form("secret1", "  Meera Rao ", "9876543210").validate().unwrap();
        assert_eq!(valid.full_name, "Meera Rao");
        assert_eq!(valid.phone.as_str(), "9876543210");
    }

    #[test]
    fn test_sign_up_reports_first_problem() {
        let err = form("short", "M", "123").validate().unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
        assert_eq!(err.user_message(), "Password must be at least 6 characters");

        let err = form("secret1", "M", "123").validate().unwrap_err();
        assert!(matches!(err, AuthError::InvalidName { min: 2 }));

        let err = form("secret1", "Meera", "5876543210").validate().unwrap_err();
        assert_eq!(err.user_message(), "Please enter a valid 10-digit phone number");
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hash).is_ok());
        assert!(matches!(
            verify_password("secret2", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
