//! The full router and middleware stack, without a database.
//!
//! Only read-only guest requests are sent: they never load or save a
//! session, so the lazy pool is never used.

use std::net::SocketAddr;

use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header, request};
use axum::response::Response;
use tower::ServiceExt;

use akf_integration_tests::offline_state;

/// A GET as `axum::serve` delivers it, with the peer address attached.
fn request(uri: &str) -> request::Builder {
    let peer = SocketAddr::from(([127, 0, 0, 1], 52100));
    Request::get(uri).extension(ConnectInfo(peer))
}

async fn send(req: Request<Body>) -> Response {
    akf_storefront::app(offline_state()).oneshot(req).await.unwrap()
}

async fn get(uri: &str) -> Response {
    send(request(uri).body(Body::empty()).unwrap()).await
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Health and middleware
// =============================================================================

#[tokio::test]
async fn test_health_is_ok() {
    let response = get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let response = get("/health").await;
    let headers = response.headers();
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    let csp = headers
        .get(header::CONTENT_SECURITY_POLICY)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(csp.contains("script-src 'self' 'nonce-"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let response = send(
        request("/health")
            .header("x-request-id", "edge-42")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "edge-42");
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_demo_product_page_renders_without_database() {
    let response = get("/products/demo-gini-cloth-saree?variant=teal-blue").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Gini Cloth Saree"));
    assert!(html.contains("Colour: Teal Blue"));
    assert!(html.contains(r#"name="variant" value="teal-blue""#));
    assert!(html.contains("wa.me/"));
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let response = get("/products/demo-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page Not Found"));

    let garbage = get("/products/not-a-product").await;
    assert_eq!(garbage.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_falls_back_to_demo_catalog() {
    let response = get("/products?category=Designer+Saree&sort=price_asc").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("product-card"));
    assert!(html.contains("/products/demo-"));
}

#[tokio::test]
async fn test_search_returns_demo_matches() {
    let response = get("/search?q=saree").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("search-item"));
    assert!(!html.contains("<html"));
}

#[tokio::test]
async fn test_short_search_renders_nothing() {
    let response = get("/search?q=a").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.trim().is_empty());
}

// =============================================================================
// Access control
// =============================================================================

#[tokio::test]
async fn test_guest_is_sent_to_sign_in() {
    let response = get("/account/orders").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/auth?return_to=%2Faccount%2Forders"
    );
}

#[tokio::test]
async fn test_admin_requires_sign_in() {
    let response = get("/admin/orders").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/auth?return_to=%2Fadmin%2Forders"
    );
}

#[tokio::test]
async fn test_htmx_guest_gets_hx_redirect() {
    let response = send(
        request("/account")
            .header("hx-request", "true")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers().get("hx-redirect").unwrap(),
        "/auth?return_to=%2Faccount"
    );
}

#[tokio::test]
async fn test_auth_page_keeps_safe_return_path_only() {
    let html = body_text(get("/auth?return_to=//evil.example&tab=signup").await).await;
    assert!(html.contains(r#"name="return_to" value="/""#));
    assert!(html.contains("Create account"));
}

#[tokio::test]
async fn test_rate_limited_routes_accept_proxied_requests() {
    let response = send(
        Request::get("/auth")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(r#"action="/auth/login""#));
}

#[tokio::test]
async fn test_sign_in_page_behind_rate_limit() {
    let response = get("/auth").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Sign in"));
}
