//! Page chrome shared by every full-page template.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::CspNonce;
use crate::models::{CurrentUser, session_keys};
use crate::services::toast::Toast;
use crate::services::whatsapp;
use crate::state::AppState;

/// Header, footer and toast data for `base.html`.
#[derive(Debug, Clone)]
pub struct Layout {
    pub nonce: String,
    pub store_name: String,
    pub user_name: Option<String>,
    pub is_admin: bool,
    /// Toast queued by the previous request, shown once.
    pub flash: Option<Toast>,
    pub whatsapp_question: String,
    pub whatsapp_collection: String,
    pub whatsapp_visit: String,
}

impl Layout {
    #[must_use]
    pub fn new(state: &AppState, nonce: String, user: Option<&CurrentUser>) -> Self {
        let number = &state.config().store.whatsapp_number;
        Self {
            nonce,
            store_name: state.config().store.name.clone(),
            user_name: user.map(|u| u.display_name().to_owned()),
            is_admin: user.is_some_and(|u| u.is_admin),
            flash: None,
            whatsapp_question: whatsapp::chat_link(number, whatsapp::greetings::QUESTION),
            whatsapp_collection: whatsapp::chat_link(number, whatsapp::greetings::COLLECTION),
            whatsapp_visit: whatsapp::chat_link(number, whatsapp::greetings::VISIT),
        }
    }

    #[must_use]
    pub fn with_flash(mut self, toast: Toast) -> Self {
        self.flash = Some(toast);
        self
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user_name.is_some()
    }
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nonce = parts
            .extensions
            .get::<CspNonce>()
            .map(|n| n.value().to_owned())
            .unwrap_or_default();

        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::new(state, nonce, None));
        };
        let user: Option<CurrentUser> = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let mut layout = Self::new(state, nonce, user.as_ref());
        layout.flash = session.remove::<Toast>(session_keys::FLASH).await.ok().flatten();
        Ok(layout)
    }
}
