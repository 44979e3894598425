//! Order domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use akf_core::{Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, UserId};

/// A placed order with its customer snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub customer_address: String,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    /// File name of the uploaded UPI screenshot, relative to the upload dir.
    pub payment_screenshot: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An order line with the name and price captured at order time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// Catalog UUID or demo slug.
    pub product_id: String,
    pub product_name: String,
    pub product_price: Money,
    pub quantity: u32,
    pub color_name: Option<String>,
    pub size: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product_price.times(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Order data collected at checkout.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub customer_address: String,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_screenshot: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub product_price: Money,
    pub quantity: u32,
    pub color_name: Option<String>,
    pub size: Option<String>,
}

impl NewOrderItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product_price.times(self.quantity)
    }
}
