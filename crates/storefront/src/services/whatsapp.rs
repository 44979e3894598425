//! WhatsApp hand-off links.
//!
//! Every message goes out through `https://wa.me/<number>?text=<message>`;
//! the shopper's own WhatsApp client sends it.

use akf_core::{OrderId, PaymentMethod};

use crate::models::{Order, OrderItem, ProductDetail};

const WA_ME: &str = "https://wa.me";

/// Pre-filled chat with `number` (international format, no `+`).
#[must_use]
pub fn chat_link(number: &str, message: &str) -> String {
    format!("{WA_ME}/{number}?text={}", urlencoding::encode(message))
}

/// Share sheet link with no recipient chosen.
#[must_use]
pub fn share_link(message: &str) -> String {
    format!("{WA_ME}/?text={}", urlencoding::encode(message))
}

/// Fixed greetings used by the floating button, hero and footer.
pub mod greetings {
    pub const QUESTION: &str = "Hi! I have a question about your products.";
    pub const COLLECTION: &str = "Hi! I'm interested in your collection";
    pub const VISIT: &str = "Hi! I'm interested in visiting your store";
    pub const ORDER_QUESTION: &str = "Hi! I just placed an order and have a question.";
}

const fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cod => "Cash on Delivery",
        PaymentMethod::Upi => "UPI (Screenshot uploaded)",
    }
}

/// The message a shopper sends the shop after placing an order.
#[must_use]
pub fn order_summary(order: &Order, items: &[OrderItem]) -> String {
    let mut message = String::from("🛍️ *New Order Received!*\n\n");
    message.push_str(&format!("*Order ID:* {}\n", order.id.short_code()));
    message.push_str(&format!("*Customer:* {}\n", order.customer_name));
    message.push_str(&format!("*Phone:* {}\n", order.customer_phone));
    message.push_str(&format!("*Address:* {}\n\n", order.customer_address));
    message.push_str(&format!(
        "*Payment:* {}\n\n",
        payment_label(order.payment_method)
    ));
    message.push_str("*Items:*\n");
    for (index, item) in items.iter().enumerate() {
        message.push_str(&format!(
            "{}. {}{} x{} - {}\n",
            index + 1,
            item.product_name,
            variant_suffix(item.color_name.as_deref(), item.size.as_deref()),
            item.quantity,
            item.line_total()
        ));
    }
    message.push_str(&format!("\n*Total: {}*", order.total_amount));
    message
}

fn variant_suffix(color: Option<&str>, size: Option<&str>) -> String {
    match (color, size) {
        (Some(c), Some(s)) => format!(" ({c}, {s})"),
        (Some(one), None) | (None, Some(one)) => format!(" ({one})"),
        (None, None) => String::new(),
    }
}

/// "Order on WhatsApp" message from a product page.
#[must_use]
pub fn product_order(product: &ProductDetail, color: Option<&str>, size: Option<&str>) -> String {
    let mut message = format!(
        "Hi! I'd like to order:\n\n*{}*\nPrice: {}",
        product.product.summary.name, product.product.summary.price
    );
    if let Some(color) = color {
        message.push_str(&format!("\nColor: {color}"));
    }
    if let Some(size) = size {
        message.push_str(&format!("\nSize: {size}"));
    }
    message.push_str("\n\nPlease confirm availability and share payment details.");
    message
}

/// Enquiry from a product card.
#[must_use]
pub fn product_enquiry(name: &str) -> String {
    format!("Hi! I'm interested in {name}")
}

/// Text for the product page share buttons.
#[must_use]
pub fn share_text(name: &str, store_name: &str) -> String {
    format!("Check out {name} at {store_name}!")
}

/// Share targets for a product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLinks {
    pub whatsapp: String,
    pub facebook: String,
    pub twitter: String,
    pub url: String,
}

impl ShareLinks {
    #[must_use]
    pub fn new(name: &str, store_name: &str, url: &str) -> Self {
        let text = share_text(name, store_name);
        Self {
            whatsapp: share_link(&format!("{text} {url}")),
            facebook: format!(
                "https://www.facebook.com/sharer/sharer.php?u={}",
                urlencoding::encode(url)
            ),
            twitter: format!(
                "https://twitter.com/intent/tweet?text={}&url={}",
                urlencoding::encode(&text),
                urlencoding::encode(url)
            ),
            url: url.to_owned(),
        }
    }
}

/// A question about an order on the success page.
#[must_use]
pub fn order_question(order_id: OrderId) -> String {
    format!(
        "{} (Order #{})",
        greetings::ORDER_QUESTION,
        order_id.short_code()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use akf_core::{Money, OrderItemId, OrderStatus};

    use super::*;
    use crate::services::catalog::demo;

    fn order(method: PaymentMethod) -> Order {
        Order {
            id: "3f2a9c1e-0b7d-4e55-9a1c-2d3e4f5a6b7c".parse().unwrap(),
            user_id: None,
            customer_name: "Meera Rao".to_string(),
            customer_phone: "9876543210".to_string(),
            customer_email: None,
            customer_address: "12 MG Road, Hyderabad".to_string(),
            total_amount: Money::from_rupees(5098),
            payment_method: method,
            status: OrderStatus::Pending,
            payment_screenshot: None,
            created_at: Utc::now(),
        }
    }

    fn item(order: &Order, name: &str, price: u32, quantity: u32, color: Option<&str>) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(),
            order_id: order.id,
            product_id: "demo-gini-cloth-saree".to_string(),
            product_name: name.to_string(),
            product_price: Money::from_rupees(price),
            quantity,
            color_name: color.map(str::to_string),
            size: None,
        }
    }

    #[test]
    fn test_order_summary_layout() {
        let order = order(PaymentMethod::Cod);
        let items = [
            item(&order, "Gini Cloth Saree", 1100, 2, None),
            item(&order, "Banarasi Saree", 2898, 1, Some("Teal Blue")),
        ];
        let message = order_summary(&order, &items);
        assert_eq!(
            message,
            "🛍️ *New Order Received!*\n\n\
             *Order ID:* 3F2A9C1E\n\
             *Customer:* Meera Rao\n\
             *Phone:* 9876543210\n\
             *Address:* 12 MG Road, Hyderabad\n\n\
             *Payment:* Cash on Delivery\n\n\
             *Items:*\n\
             1. Gini Cloth Saree x2 - ₹2,200\n\
             2. Banarasi Saree (Teal Blue) x1 - ₹2,898\n\
             \n*Total: ₹5,098*"
        );
    }

    #[test]
    fn test_upi_payment_label() {
        let message = order_summary(&order(PaymentMethod::Upi), &[]);
        assert!(message.contains("*Payment:* UPI (Screenshot uploaded)"));
    }

    #[test]
    fn test_chat_link_encodes_message() {
        let link = chat_link("917680924488", "Hi! I'm *here* & ready");
        assert_eq!(
            link,
            "https://wa.me/917680924488?text=Hi%21%20I%27m%20%2Ahere%2A%20%26%20ready"
        );
    }

    #[test]
    fn test_product_order_lines() {
        let detail = demo::find("demo-kundan-georgette-dress").unwrap().detail();
        let message = product_order(&detail, Some("Violet"), Some("Free Size"));
        assert!(message.starts_with("Hi! I'd like to order:\n\n*"));
        assert!(message.contains("\nPrice: ₹2,899"));
        assert!(message.contains("\nColor: Violet\nSize: Free Size\n\n"));
        let bare = product_order(&detail, None, None);
        assert!(!bare.contains("Color:"));
    }

    #[test]
    fn test_share_links() {
        let links = ShareLinks::new("Bandhani Saree", "AK Fashion Hub", "https://akfashionhub.in/p");
        assert_eq!(
            links.whatsapp,
            "https://wa.me/?text=Check%20out%20Bandhani%20Saree%20at%20AK%20Fashion%20Hub%21%20https%3A%2F%2Fakfashionhub.in%2Fp"
        );
        assert_eq!(
            links.facebook,
            "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fakfashionhub.in%2Fp"
        );
        assert!(links.twitter.ends_with("&url=https%3A%2F%2Fakfashionhub.in%2Fp"));
    }
}
