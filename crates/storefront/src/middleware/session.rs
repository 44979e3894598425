//! Session layer over the `tower_sessions.session` table.
//!
//! Guests get a session too: it carries their cart ID, the session-held
//! cart and wishlist, and the last placed order.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use akf_core::{CartId, OrderId};

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::models::{LocalCart, LocalWishlist, session_keys};
use crate::services::toast::Toast;

pub const SESSION_COOKIE_NAME: &str = "akf_session";

/// 30 days of inactivity, so a guest cart survives between visits.
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Typed access to the shopper's session state.
#[derive(Clone)]
pub struct ShopperSession(pub Session);

impl<S> FromRequestParts<S> for ShopperSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))
    }
}

impl ShopperSession {
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.0
    }

    async fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.0.get::<T>(key).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, key, "Unreadable session value, starting fresh");
                T::default()
            }
        }
    }

    /// The guest cart ID, created on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read or written.
    pub async fn cart_id(&self) -> Result<CartId, AppError> {
        if let Some(id) = self.0.get::<CartId>(session_keys::CART_ID).await? {
            return Ok(id);
        }
        let id = CartId::new();
        self.0.insert(session_keys::CART_ID, id).await?;
        Ok(id)
    }

    pub async fn local_cart(&self) -> LocalCart {
        self.read(session_keys::LOCAL_CART).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn save_local_cart(&self, cart: &LocalCart) -> Result<(), AppError> {
        self.0.insert(session_keys::LOCAL_CART, cart).await?;
        Ok(())
    }

    pub async fn local_wishlist(&self) -> LocalWishlist {
        self.read(session_keys::LOCAL_WISHLIST).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn save_local_wishlist(&self, wishlist: &LocalWishlist) -> Result<(), AppError> {
        self.0.insert(session_keys::LOCAL_WISHLIST, wishlist).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn set_last_order(&self, id: OrderId) -> Result<(), AppError> {
        self.0.insert(session_keys::LAST_ORDER, id).await?;
        Ok(())
    }

    pub async fn last_order(&self) -> Option<OrderId> {
        self.0.get(session_keys::LAST_ORDER).await.ok().flatten()
    }

    /// Queue a toast for the next full page render.
    pub async fn flash(&self, toast: &Toast) {
        if let Err(e) = self.0.insert(session_keys::FLASH, toast).await {
            tracing::warn!(error = %e, "Failed to store flash message");
        }
    }

    pub async fn take_flash(&self) -> Option<Toast> {
        self.0.remove::<Toast>(session_keys::FLASH).await.ok().flatten()
    }
}
