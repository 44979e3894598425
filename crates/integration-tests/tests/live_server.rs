//! Tests against a running storefront with its database.
//!
//! Start the server, then run:
//! ```bash
//! STOREFRONT_TEST_URL=http://localhost:3000 cargo test -p akf-integration-tests -- --ignored
//! ```

use reqwest::{Client, StatusCode, redirect::Policy};

use akf_integration_tests::live_url;

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

fn base() -> String {
    live_url().expect("STOREFRONT_TEST_URL must be set")
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_guest_cart_keeps_demo_items() {
    let client = client();
    let base = base();

    let response = client
        .post(format!("{base}/cart/add"))
        .header("hx-request", "true")
        .form(&[
            ("product_id", "demo-gini-cloth-saree"),
            ("variant", "teal-blue"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let trigger = response.headers()["hx-trigger"].to_str().unwrap().to_owned();
    assert!(trigger.contains("cart-updated"));
    assert!(trigger.contains("Added to cart!"));

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">1<"));

    let page = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Gini Cloth Saree"));
    assert!(page.contains("Teal Blue"));
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_missing_variant_is_not_added() {
    let client = client();
    let base = base();

    let response = client
        .post(format!("{base}/cart/add"))
        .header("hx-request", "true")
        .form(&[("product_id", "demo-gini-cloth-saree")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let trigger = response.headers()["hx-trigger"].to_str().unwrap().to_owned();
    assert!(trigger.contains("Please select a color variant"));
    assert!(!trigger.contains("cart-updated"));
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_guest_wishlist_toggle() {
    let client = client();
    let base = base();

    let response = client
        .post(format!("{base}/wishlist/add"))
        .form(&[("product_id", "demo-bandhani-saree")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = client
        .get(format!("{base}/wishlist"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Bandhani Saree"));
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_empty_checkout_shows_empty_page() {
    let response = client()
        .get(format!("{}/checkout", base()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Your cart is empty"));
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_readiness_reaches_database() {
    let response = client()
        .get(format!("{}/health/ready", base()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
