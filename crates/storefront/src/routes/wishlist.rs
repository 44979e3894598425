//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;
use tracing::instrument;

use akf_core::ProductKey;

use crate::db::WishlistRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, ShopperSession};
use crate::models::{ColorVariant, CurrentUser, LocalWishlist, Wishlist};
use crate::routes::views::WishlistLineView;
use crate::routes::{Layout, back_path, htmx_ack, is_htmx, redirect_with_flash};
use crate::services::catalog::demo;
use crate::services::toast::Toast;
use crate::services::wishlist::{LOGIN_REQUIRED, WishlistService};
use crate::state::AppState;

const WISHLIST_UPDATED: &str = "wishlist-updated";

fn service<'a>(
    state: &'a AppState,
    user: Option<&CurrentUser>,
) -> WishlistService<WishlistRepository<'a>> {
    WishlistService::new(WishlistRepository::new(state.pool()), user.map(|u| u.id))
}

/// The visitor's wishlist and the session copy it was built from.
pub(crate) async fn load_wishlist(
    state: &AppState,
    session: &ShopperSession,
    user: Option<&CurrentUser>,
) -> (Wishlist, LocalWishlist) {
    let local = session.local_wishlist().await;
    let wishlist = service(state, user).load(&local).await;
    (wishlist, local)
}

#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistShowTemplate {
    pub layout: Layout,
    pub lines: Vec<WishlistLineView>,
}

/// Wishlist badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_count.html")]
pub struct WishlistCountTemplate {
    pub count: usize,
}

/// Display the wishlist page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    OptionalAuth(user): OptionalAuth,
    session: ShopperSession,
) -> WishlistShowTemplate {
    let (wishlist, _) = load_wishlist(&state, &session, user.as_ref()).await;
    WishlistShowTemplate {
        layout,
        lines: wishlist.lines.iter().map(WishlistLineView::from).collect(),
    }
}

/// Current wishlist size for the header badge.
#[instrument(skip_all)]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: ShopperSession,
) -> WishlistCountTemplate {
    let (wishlist, _) = load_wishlist(&state, &session, user.as_ref()).await;
    WishlistCountTemplate {
        count: wishlist.total_items(),
    }
}

#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: String,
    pub variant: Option<String>,
}

impl WishlistForm {
    fn variant_id(&self) -> Option<&str> {
        self.variant.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Colour variant of a demo product, if one was chosen.
    fn demo_variant(&self, key: &ProductKey) -> Option<ColorVariant> {
        match key {
            ProductKey::Demo(slug) => demo::find(slug)?.variant(self.variant_id()?),
            ProductKey::Catalog(_) => None,
        }
    }
}

async fn respond(
    session: &ShopperSession,
    headers: &HeaderMap,
    local: &LocalWishlist,
    toast: Option<Toast>,
) -> Result<Response, AppError> {
    session.save_local_wishlist(local).await?;
    if is_htmx(headers) {
        return Ok(htmx_ack(toast.as_ref(), &[WISHLIST_UPDATED]));
    }
    Ok(redirect_with_flash(session, toast.as_ref(), &back_path(headers, "/wishlist")).await)
}

/// Save a product to the wishlist.
#[instrument(skip(state, user, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: ShopperSession,
    headers: HeaderMap,
    Form(form): Form<WishlistForm>,
) -> Result<Response, AppError> {
    let key = ProductKey::parse(&form.product_id)
        .map_err(|_| AppError::BadRequest("Unknown product".to_owned()))?;
    let variant = form.demo_variant(&key);

    let (mut wishlist, mut local) = load_wishlist(&state, &session, user.as_ref()).await;
    let toast = service(&state, user.as_ref())
        .add(&mut wishlist, &mut local, &key, variant.as_ref())
        .await;
    respond(&session, &headers, &local, toast).await
}

/// Remove a product (or one colour of a demo product).
#[instrument(skip(state, user, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: ShopperSession,
    headers: HeaderMap,
    Form(form): Form<WishlistForm>,
) -> Result<Response, AppError> {
    let key = ProductKey::parse(&form.product_id)
        .map_err(|_| AppError::BadRequest("Unknown product".to_owned()))?;

    let (mut wishlist, mut local) = load_wishlist(&state, &session, user.as_ref()).await;
    let toast = service(&state, user.as_ref())
        .remove(&mut wishlist, &mut local, &key, form.variant_id())
        .await
        .unwrap_or_else(|| Toast::error(LOGIN_REQUIRED));
    respond(&session, &headers, &local, Some(toast)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_variant_lookup() {
        let form = WishlistForm {
            product_id: "demo-gini-cloth-saree".to_owned(),
            variant: Some("teal-blue".to_owned()),
        };
        let key = ProductKey::parse(&form.product_id).unwrap();
        assert_eq!(form.demo_variant(&key).unwrap().name, "Teal Blue");

        let blank = WishlistForm {
            product_id: form.product_id.clone(),
            variant: Some(String::new()),
        };
        assert!(blank.demo_variant(&key).is_none());
    }
}
