//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page with the New Arrivals grid
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database)
//!
//! # Catalog
//! GET  /products                - Full listing (category, price, sort)
//! GET  /products/{key}          - Product page (UUID or demo- slug)
//! POST /products/{key}/notify   - Back-in-stock request
//! GET  /search?q=               - Search dropdown fragment (HTMX)
//!
//! # Cart (HTMX fragments, plain POST fallback)
//! GET  /cart                    - Cart page
//! GET  /cart/count              - Cart badge fragment
//! POST /cart/add                - Add one unit
//! POST /cart/update             - Set a line's quantity
//! POST /cart/remove             - Remove a line
//! POST /cart/clear              - Empty the cart
//!
//! # Wishlist
//! GET  /wishlist                - Wishlist page
//! GET  /wishlist/count          - Wishlist badge fragment
//! POST /wishlist/add            - Save a product
//! POST /wishlist/remove         - Remove a product
//!
//! # Checkout
//! GET  /checkout                - Delivery details and payment choice
//! POST /checkout                - Place the order (multipart, screenshot for UPI)
//! GET  /order-success           - Confirmation with the WhatsApp hand-off
//!
//! # Auth
//! GET  /auth                    - Sign in / sign up (?return_to=)
//! POST /auth/login              - Sign in
//! POST /auth/register           - Sign up
//! POST /auth/logout             - Sign out
//!
//! # Account (requires auth)
//! GET  /account                 - Profile and saved addresses
//! POST /account/profile         - Update name and phone
//! POST /account/addresses       - Add an address
//! POST /account/addresses/{id}/default - Make an address the default
//! POST /account/addresses/{id}/delete  - Delete an address
//! GET  /account/orders          - Order history
//!
//! # Admin (requires the admin role)
//! GET  /admin                   - Dashboard
//! GET  /admin/products          - Product list
//! GET  /admin/products/new      - New product form
//! POST /admin/products          - Create a product
//! GET  /admin/products/{id}     - Edit form
//! POST /admin/products/{id}     - Save a product
//! POST /admin/products/{id}/delete - Delete a product
//! GET  /admin/categories        - Category list
//! POST /admin/categories        - Add a category
//! POST /admin/categories/{id}/delete - Deactivate a category
//! GET  /admin/orders            - Order list
//! POST /admin/orders/{id}/status - Change an order's status
//! GET  /admin/orders/{id}/screenshot - Payment screenshot
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod layout;
pub mod products;
pub mod search;
pub mod views;
pub mod wishlist;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderMap, HeaderValue, StatusCode, header::REFERER},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use url::Url;

use crate::middleware::{ShopperSession, auth_rate_limiter, checkout_rate_limiter};
use crate::services::payments::MAX_SCREENSHOT_BYTES;
use crate::services::toast::{Toast, hx_trigger};
use crate::state::AppState;

pub use layout::Layout;

/// Screenshot plus room for the text fields.
const CHECKOUT_BODY_LIMIT: usize = MAX_SCREENSHOT_BYTES + 64 * 1024;

/// Whether the request came from HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Same-site path from the `Referer` header, or `fallback`.
///
/// Only the path and query are kept so a forged referer cannot redirect
/// off-site.
#[must_use]
pub fn back_path(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|r| Url::parse(r).ok())
        .map_or_else(
            || fallback.to_string(),
            |url| match url.query() {
                Some(q) => format!("{}?{q}", url.path()),
                None => url.path().to_string(),
            },
        )
}

/// Only local absolute paths are followed after sign-in.
#[must_use]
pub fn safe_return_to(return_to: Option<&str>) -> String {
    return_to
        .filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
        .unwrap_or("/")
        .to_string()
}

/// Response to an HTMX action that swaps nothing.
#[must_use]
pub fn htmx_ack(toast: Option<&Toast>, events: &[&str]) -> Response {
    with_trigger(StatusCode::NO_CONTENT.into_response(), toast, events)
}

/// Attach an `HX-Trigger` header carrying `events` and the toast.
#[must_use]
pub fn with_trigger(mut response: Response, toast: Option<&Toast>, events: &[&str]) -> Response {
    if toast.is_none() && events.is_empty() {
        return response;
    }
    if let Ok(value) = HeaderValue::from_str(&hx_trigger(toast, events)) {
        response.headers_mut().insert("hx-trigger", value);
    }
    response
}

/// Plain form fallback: queue the toast and go back.
pub async fn redirect_with_flash(
    session: &ShopperSession,
    toast: Option<&Toast>,
    to: &str,
) -> Response {
    if let Some(toast) = toast {
        session.flash(toast).await;
    }
    Redirect::to(to).into_response()
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{key}", get(products::show))
        .route("/{key}/notify", post(products::notify))
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/count", get(wishlist::count))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
}

pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .layer(DefaultBodyLimit::max(CHECKOUT_BODY_LIMIT))
        .layer(checkout_rate_limiter())
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::page))
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter())
        .route("/logout", post(auth::logout))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/profile", post(account::update_profile))
        .route("/addresses", post(account::create_address))
        .route("/addresses/{id}/default", post(account::set_default_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
        .route("/orders", get(account::orders))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route(
            "/products",
            get(admin::products::index).post(admin::products::create),
        )
        .route("/products/new", get(admin::products::new))
        .route(
            "/products/{id}",
            get(admin::products::edit).post(admin::products::update),
        )
        .route("/products/{id}/delete", post(admin::products::delete))
        .route(
            "/categories",
            get(admin::categories::index).post(admin::categories::create),
        )
        .route("/categories/{id}/delete", post(admin::categories::delete))
        .route("/orders", get(admin::orders::index))
        .route("/orders/{id}/status", post(admin::orders::update_status))
        .route("/orders/{id}/screenshot", get(admin::orders::screenshot))
}

/// All storefront routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/search", get(search::search))
        .route("/order-success", get(checkout::success))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/admin", admin_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_back_path_strips_origin() {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://evil.example/products?sort=name"));
        assert_eq!(back_path(&headers, "/"), "/products?sort=name");
        assert_eq!(back_path(&HeaderMap::new(), "/cart"), "/cart");
    }

    #[test]
    fn test_safe_return_to() {
        assert_eq!(safe_return_to(Some("/checkout")), "/checkout");
        assert_eq!(safe_return_to(Some("//evil.example")), "/");
        assert_eq!(safe_return_to(Some("https://evil.example")), "/");
        assert_eq!(safe_return_to(None), "/");
    }

    #[test]
    fn test_htmx_ack_sets_trigger() {
        let response = htmx_ack(Some(&Toast::success("Added to cart!")), &["cart-updated"]);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let header = response.headers().get("hx-trigger").unwrap().to_str().unwrap();
        assert!(header.contains("cart-updated"));
        assert!(htmx_ack(None, &[]).headers().get("hx-trigger").is_none());
    }
}
