//! A demo product from product page to WhatsApp hand-off, with an
//! in-memory order store.

use std::sync::Mutex;

use chrono::Utc;

use akf_core::{
    CartItemId, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductKey,
};
use akf_integration_tests::{offline_state, test_config};
use akf_storefront::db::RepositoryError;
use akf_storefront::models::{Cart, CartLine, NewOrder, Order, OrderItem, ProductDetail};
use akf_storefront::services::catalog::{Selection, SelectionError, validate_selection};
use akf_storefront::services::checkout::{
    CheckoutError, CheckoutService, CustomerDetails, OrderStore,
};
use akf_storefront::services::payments::upi::UpiLinks;
use akf_storefront::services::whatsapp;

#[derive(Default)]
struct MemoryStore {
    orders: Mutex<Vec<(Order, Vec<OrderItem>)>>,
}

impl OrderStore for &MemoryStore {
    async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let id = OrderId::new();
        let created = Order {
            id,
            user_id: order.user_id,
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            customer_email: order.customer_email.clone(),
            customer_address: order.customer_address.clone(),
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            status: OrderStatus::Pending,
            payment_screenshot: order.payment_screenshot.clone(),
            created_at: Utc::now(),
        };
        let items = order
            .items
            .iter()
            .map(|item| OrderItem {
                id: OrderItemId::new(),
                order_id: id,
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                product_price: item.product_price,
                quantity: item.quantity,
                color_name: item.color_name.clone(),
                size: item.size.clone(),
            })
            .collect();
        self.orders.lock().unwrap().push((created.clone(), items));
        Ok(created)
    }
}

async fn demo_detail(slug: &str) -> ProductDetail {
    let state = offline_state();
    let key = ProductKey::parse(slug).unwrap();
    state.catalog().detail(&key).await.unwrap().unwrap()
}

fn details() -> CustomerDetails {
    CustomerDetails {
        name: "Meera Rao".to_string(),
        phone: "9876543210".to_string(),
        email: String::new(),
        address: "12 MG Road, Hyderabad".to_string(),
    }
}

fn cart_of(detail: &ProductDetail, selection: &Selection, quantity: u32) -> Cart {
    let options = validate_selection(detail, selection).unwrap();
    Cart::new(vec![CartLine {
        id: CartItemId::new(),
        product: detail.product.summary.clone(),
        quantity,
        options,
    }])
}

#[tokio::test]
async fn test_demo_variant_must_be_chosen() {
    let detail = demo_detail("demo-gini-cloth-saree").await;
    assert_eq!(
        validate_selection(&detail, &Selection::default()).unwrap_err(),
        SelectionError::VariantRequired
    );
}

#[tokio::test]
async fn test_cod_order_and_whatsapp_summary() {
    let detail = demo_detail("demo-gini-cloth-saree").await;
    let selection = Selection {
        color_variant: Some("teal-blue".to_string()),
        ..Selection::default()
    };
    let cart = cart_of(&detail, &selection, 2);

    let store = MemoryStore::default();
    let order = CheckoutService::new(&store)
        .place_order(&cart, &details(), None, PaymentMethod::Cod, None)
        .await
        .unwrap();
    assert_eq!(order.total_amount, cart.total_price());
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.payment_screenshot.is_none());

    let orders = store.orders.lock().unwrap();
    let (saved, items) = &orders[0];
    assert_eq!(items[0].product_id, "demo-gini-cloth-saree");
    assert_eq!(items[0].color_name.as_deref(), Some("Teal Blue"));

    let message = whatsapp::order_summary(saved, items);
    assert!(message.contains(&format!("*Order ID:* {}", order.id.short_code())));
    assert!(message.contains("*Payment:* Cash on Delivery"));
    assert!(message.contains("1. Gini Cloth Saree (Teal Blue) x2 - ₹3,000"));
    assert!(message.ends_with("*Total: ₹3,000*"));

    let config = test_config();
    let link = whatsapp::chat_link(&config.store.whatsapp_number, &message);
    assert!(link.starts_with("https://wa.me/"));
    assert!(link.contains("?text="));
}

#[tokio::test]
async fn test_upi_order_needs_a_screenshot() {
    let detail = demo_detail("demo-bandhani-saree").await;
    let variant = detail.color_variants[0].id.clone();
    let cart = cart_of(
        &detail,
        &Selection {
            color_variant: Some(variant),
            ..Selection::default()
        },
        1,
    );

    let store = MemoryStore::default();
    let service = CheckoutService::new(&store);
    let missing = service
        .place_order(&cart, &details(), None, PaymentMethod::Upi, None)
        .await
        .unwrap_err();
    assert!(matches!(missing, CheckoutError::MissingScreenshot));
    assert_eq!(missing.user_message(), "Please upload payment screenshot");
    assert!(store.orders.lock().unwrap().is_empty());

    let order = service
        .place_order(
            &cart,
            &details(),
            None,
            PaymentMethod::Upi,
            Some("proof.png".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(order.payment_screenshot.as_deref(), Some("proof.png"));
}

#[tokio::test]
async fn test_upi_link_for_cart_total() {
    let detail = demo_detail("demo-pattu-silk-saree").await;
    let variant = detail.color_variants[0].id.clone();
    let cart = cart_of(
        &detail,
        &Selection {
            color_variant: Some(variant),
            ..Selection::default()
        },
        1,
    );

    let config = test_config();
    let links = UpiLinks::new(&config.upi, &config.store.whatsapp_number);
    let link = links
        .deep_link(cart.total_price().amount(), Some("ORDER-12345"))
        .unwrap();
    assert!(link.starts_with("upi://pay?"));
    assert!(link.contains(&format!("am={}", cart.total_price().to_fixed_2())));
    assert!(link.contains("cu=INR"));
}

#[tokio::test]
async fn test_blank_details_are_rejected_before_saving() {
    let detail = demo_detail("demo-gini-cloth-saree").await;
    let cart = cart_of(
        &detail,
        &Selection {
            color_variant: Some("wine-purple".to_string()),
            ..Selection::default()
        },
        1,
    );
    let blank = CustomerDetails {
        address: "   ".to_string(),
        ..details()
    };

    let store = MemoryStore::default();
    let err = CheckoutService::new(&store)
        .place_order(&cart, &blank, None, PaymentMethod::Cod, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::MissingFields));
    assert!(store.orders.lock().unwrap().is_empty());
}
