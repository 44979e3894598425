//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] akf_core::EmailError),

    /// Invalid Indian mobile number.
    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] akf_core::PhoneError),

    /// Name too short.
    #[error("name must be at least {min} characters")]
    InvalidName { min: usize },

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Text shown on the sign-in and sign-up forms.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address".to_owned(),
            Self::InvalidPhone(_) => "Please enter a valid 10-digit phone number".to_owned(),
            Self::InvalidName { min } => format!("Name must be at least {min} characters"),
            Self::InvalidCredentials | Self::UserNotFound => {
                "Invalid email or password. Please try again.".to_owned()
            }
            Self::UserAlreadyExists => {
                "This email is already registered. Please sign in instead.".to_owned()
            }
            Self::WeakPassword(reason) => reason.clone(),
            Self::Repository(_) | Self::PasswordHash => {
                "Something went wrong. Please try again.".to_owned()
            }
        }
    }
}
