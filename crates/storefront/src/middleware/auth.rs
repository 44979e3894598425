//! Authentication extractors.
//!
//! The signed-in user lives in the session under
//! [`session_keys::CURRENT_USER`]. Admin access is checked against
//! `storefront.user_role` on every request.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use akf_core::UserRole;

use crate::db::UserRepository;
use crate::error::ErrorPage;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Sign-in page with a path to come back to.
#[must_use]
pub fn login_url(return_to: &str) -> String {
    if return_to.is_empty() || return_to == "/" {
        return "/auth".to_string();
    }
    format!("/auth?return_to={}", urlencoding::encode(return_to))
}

/// Full request path; nested routers strip their prefix from `parts.uri`.
fn return_path(parts: &Parts) -> String {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0)
        .path_and_query()
        .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string())
}

fn is_htmx(parts: &Parts) -> bool {
    parts.headers.contains_key("hx-request")
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Requires a signed-in user; guests are sent to the sign-in page.
pub struct RequireAuth(pub CurrentUser);

pub enum AuthRejection {
    /// Full page navigation to the sign-in page.
    RedirectToLogin(String),
    /// HTMX request: the client follows `HX-Redirect`.
    HxRedirect(String),
}

impl AuthRejection {
    fn for_request(parts: &Parts) -> Self {
        let url = login_url(&return_path(parts));
        if is_htmx(parts) {
            Self::HxRedirect(url)
        } else {
            Self::RedirectToLogin(url)
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(url) => Redirect::to(&url).into_response(),
            Self::HxRedirect(url) => {
                let mut response = StatusCode::NO_CONTENT.into_response();
                if let Ok(value) = HeaderValue::from_str(&url) {
                    response.headers_mut().insert("hx-redirect", value);
                }
                response
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AuthRejection::for_request(parts))
    }
}

/// The signed-in user, if any.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Requires a signed-in user holding the `admin` role.
pub struct RequireAdmin(pub CurrentUser);

pub enum AdminRejection {
    Auth(AuthRejection),
    Forbidden,
    Unavailable,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(rejection) => rejection.into_response(),
            Self::Forbidden => ErrorPage::new(
                StatusCode::FORBIDDEN,
                "Access Denied",
                "You don't have permission to access the admin panel.",
            )
            .into_response(),
            Self::Unavailable => ErrorPage::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service Unavailable",
                "Something went wrong. Please try again.",
            )
            .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)
            .await
            .ok_or_else(|| AdminRejection::Auth(AuthRejection::for_request(parts)))?;

        let is_admin = UserRepository::new(state.pool())
            .has_role(user.id, UserRole::Admin)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user.id, "Admin role check failed");
                AdminRejection::Unavailable
            })?;

        if !is_admin {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin denied");
            return Err(AdminRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Store the signed-in user.
///
/// The session ID is rotated first so a pre-login ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Forget the signed-in user (sign out). Cart and wishlist stay.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_keeps_return_path() {
        assert_eq!(login_url("/"), "/auth");
        assert_eq!(login_url(""), "/auth");
        assert_eq!(
            login_url("/account?tab=orders"),
            "/auth?return_to=%2Faccount%3Ftab%3Dorders"
        );
    }
}
