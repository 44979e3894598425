//! Cart route handlers.
//!
//! Forms post here with or without HTMX. HTMX requests get the cart panel
//! fragment (or an empty 204) plus an `HX-Trigger` header; plain posts are
//! redirected back with the toast queued in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use akf_core::{CartItemId, ProductKey};

use crate::db::{CartRepository, ProductRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::ShopperSession;
use crate::models::{Cart, LocalCart};
use crate::routes::products::SelectionQuery;
use crate::routes::views::CartLineView;
use crate::routes::{Layout, back_path, htmx_ack, is_htmx, redirect_with_flash, with_trigger};
use crate::services::cart::CartService;
use crate::services::catalog::validate_selection;
use crate::services::toast::Toast;
use crate::state::AppState;

const CART_UPDATED: &str = "cart-updated";

pub(crate) type StoreCart<'a> = CartService<CartRepository<'a>, ProductRepository<'a>>;

/// Cart service for the visitor's session cart.
pub(crate) async fn cart_service<'a>(
    state: &'a AppState,
    session: &ShopperSession,
) -> Result<StoreCart<'a>, AppError> {
    let cart_id = session.cart_id().await?;
    Ok(CartService::new(
        CartRepository::new(state.pool()),
        ProductRepository::new(state.pool()),
        cart_id,
    ))
}

/// The visitor's cart and the session copy it was built from.
pub(crate) async fn load_cart(
    state: &AppState,
    session: &ShopperSession,
) -> Result<(Cart, LocalCart), AppError> {
    let local = session.local_cart().await;
    let cart = cart_service(state, session).await?.load(&local).await;
    Ok((cart, local))
}

// =============================================================================
// Views
// =============================================================================

/// Lines and totals, shared by the cart page and its HTMX fragment.
#[derive(Debug, Clone)]
pub struct CartPanel {
    pub lines: Vec<CartLineView>,
    pub total_items: u32,
    pub total_price: String,
}

impl From<&Cart> for CartPanel {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines.iter().map(CartLineView::from).collect(),
            total_items: cart.total_items(),
            total_price: cart.total_price().display(),
        }
    }
}

impl CartPanel {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartPanel,
}

/// Cart panel fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartPanel,
}

/// Cart count badge fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    session: ShopperSession,
) -> Result<CartShowTemplate, AppError> {
    let (cart, _) = load_cart(&state, &session).await?;
    Ok(CartShowTemplate {
        layout,
        cart: CartPanel::from(&cart),
    })
}

/// Item count for the header badge.
#[instrument(skip_all)]
pub async fn count(
    State(state): State<AppState>,
    session: ShopperSession,
) -> Result<CartCountTemplate, AppError> {
    let (cart, _) = load_cart(&state, &session).await?;
    Ok(CartCountTemplate {
        count: cart.total_items(),
    })
}

/// Add to cart form data: the product and the page's selection.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    #[serde(flatten)]
    pub selection: SelectionQuery,
}

/// Add one unit of the selected product.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: ShopperSession,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound("Product not found".to_owned());
    let key = ProductKey::parse(&form.product_id).map_err(|_| not_found())?;
    let detail = state.catalog().detail(&key).await?.ok_or_else(not_found)?;
    let fallback = format!("/products/{key}");

    let options = match validate_selection(&detail, &form.selection.selection()) {
        Ok(options) => options,
        Err(e) => {
            let toast = Toast::error(e.to_string());
            if is_htmx(&headers) {
                return Ok(htmx_ack(Some(&toast), &[]));
            }
            return Ok(
                redirect_with_flash(&session, Some(&toast), &back_path(&headers, &fallback)).await,
            );
        }
    };

    let service = cart_service(&state, &session).await?;
    let mut local = session.local_cart().await;
    let mut cart = service.load(&local).await;
    let message = service.add(&mut cart, &mut local, &key, &options).await;
    session.save_local_cart(&local).await?;

    let toast = Toast::success(message);
    if is_htmx(&headers) {
        return Ok(htmx_ack(Some(&toast), &[CART_UPDATED]));
    }
    Ok(redirect_with_flash(&session, Some(&toast), &back_path(&headers, &fallback)).await)
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: CartItemId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: CartItemId,
}

/// Answer a cart page change: the refreshed panel for HTMX, a redirect otherwise.
async fn panel_response(
    session: &ShopperSession,
    headers: &HeaderMap,
    cart: &Cart,
    local: &LocalCart,
    toast: Option<Toast>,
) -> Result<Response, AppError> {
    session.save_local_cart(local).await?;
    if is_htmx(headers) {
        let fragment = CartItemsTemplate {
            cart: CartPanel::from(cart),
        }
        .into_response();
        return Ok(with_trigger(fragment, toast.as_ref(), &[CART_UPDATED]));
    }
    Ok(redirect_with_flash(session, toast.as_ref(), &back_path(headers, "/cart")).await)
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: ShopperSession,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response, AppError> {
    let service = cart_service(&state, &session).await?;
    let mut local = session.local_cart().await;
    let mut cart = service.load(&local).await;
    let message = service
        .update_quantity(&mut cart, &mut local, form.line_id, form.quantity)
        .await;
    panel_response(&session, &headers, &cart, &local, message.map(Toast::success)).await
}

/// Remove a line.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: ShopperSession,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response, AppError> {
    let service = cart_service(&state, &session).await?;
    let mut local = session.local_cart().await;
    let mut cart = service.load(&local).await;
    let message = service.remove(&mut cart, &mut local, form.line_id).await;
    panel_response(&session, &headers, &cart, &local, Some(Toast::success(message))).await
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    session: ShopperSession,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let service = cart_service(&state, &session).await?;
    let mut local = session.local_cart().await;
    let mut cart = service.load(&local).await;
    service.clear(&mut cart, &mut local).await;
    panel_response(&session, &headers, &cart, &local, None).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{CartLine, LineOptions};
    use crate::services::catalog::demo;

    #[test]
    fn test_panel_totals() {
        let line = |slug: &str, quantity| CartLine {
            id: CartItemId::new(),
            product: demo::find(slug).unwrap().summary(),
            quantity,
            options: LineOptions::default(),
        };
        let cart = Cart::new(vec![
            line("demo-gini-cloth-saree", 2),
            line("demo-cotton-dupatta-dress", 1),
        ]);
        let panel = CartPanel::from(&cart);
        assert_eq!(panel.total_items, 3);
        assert_eq!(panel.total_price, "₹3,900");
        assert!(!panel.is_empty());
        assert!(CartPanel::from(&Cart::default()).is_empty());
    }

    #[test]
    fn test_add_form_reads_selection() {
        let form: AddToCartForm = serde_urlencoded::from_str(
            "product_id=demo-gini-cloth-saree&variant=teal-blue&color=&size=",
        )
        .unwrap();
        let selection = form.selection.selection();
        assert_eq!(selection.color_variant.as_deref(), Some("teal-blue"));
        assert!(selection.size.is_none());
    }
}
