//! Session-related types.
//!
//! Types stored in the session for authentication and guest shopping state.

use serde::{Deserialize, Serialize};

use akf_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Name from the profile, for greetings.
    pub full_name: Option<String>,
    /// Menu hint only; admin routes re-check the role.
    #[serde(default)]
    pub is_admin: bool,
}

impl CurrentUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.local_part())
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the guest cart ID that remote cart rows hang off.
    pub const CART_ID: &str = "cart_session_id";

    /// Key for the session-held copy of the cart.
    pub const LOCAL_CART: &str = "local_cart";

    /// Key for the session-held wishlist.
    pub const LOCAL_WISHLIST: &str = "local_wishlist";

    /// Key for the most recently placed order, shown on the success page.
    pub const LAST_ORDER: &str = "last_order";

    /// Key for a toast waiting for the next full page render.
    pub const FLASH: &str = "flash";
}
