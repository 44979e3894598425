//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the shopper sees a generic error page; details
//! never reach the response.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::payments::UploadError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Auth(AuthError::UserAlreadyExists) => {
                StatusCode::CONFLICT
            }
            Self::Auth(
                AuthError::InvalidCredentials | AuthError::UserNotFound,
            ) => StatusCode::UNAUTHORIZED,
            Self::Auth(
                AuthError::InvalidEmail(_)
                | AuthError::InvalidPhone(_)
                | AuthError::InvalidName { .. }
                | AuthError::WeakPassword(_),
            )
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upload(UploadError::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upload(UploadError::Missing | UploadError::UnsupportedType(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Database(_)
            | Self::Auth(_)
            | Self::Session(_)
            | Self::Upload(UploadError::Io(_))
            | Self::Template(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show the shopper.
    fn public_message(&self) -> String {
        match self {
            Self::Auth(err) => err.user_message(),
            Self::Upload(UploadError::Io(_)) => "Something went wrong. Please try again.".to_string(),
            Self::Upload(err) => err.to_string(),
            Self::NotFound(_) | Self::Database(RepositoryError::NotFound) => {
                "The page you're looking for doesn't exist.".to_string()
            }
            Self::BadRequest(msg) => msg.clone(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let title = match status {
            StatusCode::NOT_FOUND => "Page Not Found",
            s if s.is_server_error() => "Something Went Wrong",
            _ => "Request Failed",
        };
        ErrorPage::new(status, title, &self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Standalone error page, rendered without the shop layout.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub status: StatusCode,
    pub title: String,
    pub message: String,
}

impl ErrorPage {
    #[must_use]
    pub fn new(status: StatusCode, title: &str, message: &str) -> Self {
        Self {
            status,
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        match self.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render error page");
                (self.status, self.message).into_response()
            }
        }
    }
}

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Record a shopper action so it shows up in later error reports.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };
    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }
    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product demo-x".to_string());
        assert_eq!(err.to_string(), "Not found: product demo-x");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::Database(RepositoryError::NotFound)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::Auth(AuthError::InvalidCredentials)), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Upload(UploadError::TooLarge)), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            status_of(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let message = AppError::Internal("pool exhausted at 10.0.0.3".into()).public_message();
        assert!(!message.contains("10.0.0.3"));
        let message = AppError::Auth(AuthError::UserAlreadyExists).public_message();
        assert_eq!(message, "This email is already registered. Please sign in instead.");
    }
}
