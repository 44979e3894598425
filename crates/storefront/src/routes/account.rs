//! Account pages: profile, saved addresses and order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use akf_core::{AddressId, Phone};

use crate::db::{AddressRepository, OrderRepository, ProfileRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAuth, ShopperSession};
use crate::models::{NewAddress, OrderWithItems, SavedAddress, session_keys};
use crate::routes::Layout;
use crate::services::toast::Toast;
use crate::state::AppState;

// =============================================================================
// Profile and addresses
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub layout: Layout,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub addresses: Vec<SavedAddress>,
}

/// Display the profile page.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(user): RequireAuth,
) -> Result<AccountTemplate, AppError> {
    let profile = ProfileRepository::new(state.pool()).get(user.id).await?;
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(AccountTemplate {
        layout,
        email: user.email.to_string(),
        full_name: profile.full_name.unwrap_or_default(),
        phone: profile.phone.unwrap_or_default(),
        addresses,
    })
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub full_name: String,
    pub phone: String,
}

/// Update name and phone.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(mut user): RequireAuth,
    session: ShopperSession,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect, AppError> {
    let full_name = form.full_name.trim();
    let toast = if full_name.is_empty() || form.phone.trim().is_empty() {
        Toast::error("Please fill in all required fields")
    } else {
        match Phone::parse(&form.phone) {
            Err(_) => Toast::error("Please enter a valid 10-digit phone number"),
            Ok(phone) => match ProfileRepository::new(state.pool())
                .upsert(user.id, full_name, phone.as_str())
                .await
            {
                Ok(()) => {
                    user.full_name = Some(full_name.to_owned());
                    session
                        .session()
                        .insert(session_keys::CURRENT_USER, &user)
                        .await?;
                    Toast::success("Profile updated successfully")
                }
                Err(e) => {
                    warn!(error = %e, "Failed to update profile");
                    Toast::error("Failed to update profile")
                }
            },
        }
    };
    session.flash(&toast).await;
    Ok(Redirect::to("/account"))
}

#[derive(Debug, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl AddressForm {
    /// Trimmed address, or `None` when a required field is blank.
    fn to_address(&self) -> Option<NewAddress> {
        let required = [
            &self.full_name,
            &self.phone,
            &self.address_line1,
            &self.city,
            &self.state,
            &self.pincode,
        ];
        if required.iter().any(|f| f.trim().is_empty()) {
            return None;
        }
        let label = self.label.trim();
        Some(NewAddress {
            label: if label.is_empty() { "Home" } else { label }.to_owned(),
            full_name: self.full_name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            address_line1: self.address_line1.trim().to_owned(),
            address_line2: self
                .address_line2
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_owned),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            pincode: self.pincode.trim().to_owned(),
        })
    }
}

/// Save a new address; the first one becomes the default.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: ShopperSession,
    Form(form): Form<AddressForm>,
) -> Redirect {
    let toast = match form.to_address() {
        None => Toast::error("Please fill in all required fields"),
        Some(address) => match AddressRepository::new(state.pool())
            .create(user.id, &address)
            .await
        {
            Ok(_) => Toast::success("Address added"),
            Err(e) => {
                warn!(error = %e, "Failed to add address");
                Toast::error("Failed to add address")
            }
        },
    };
    session.flash(&toast).await;
    Redirect::to("/account")
}

#[instrument(skip_all, fields(user_id = %user.id, address = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: ShopperSession,
    Path(id): Path<AddressId>,
) -> Redirect {
    let toast = match AddressRepository::new(state.pool()).delete(user.id, id).await {
        Ok(()) => Toast::success("Address deleted"),
        Err(e) => {
            warn!(error = %e, "Failed to delete address");
            Toast::error("Failed to delete address")
        }
    };
    session.flash(&toast).await;
    Redirect::to("/account")
}

#[instrument(skip_all, fields(user_id = %user.id, address = %id))]
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: ShopperSession,
    Path(id): Path<AddressId>,
) -> Redirect {
    match AddressRepository::new(state.pool()).set_default(user.id, id).await {
        Ok(()) => session.flash(&Toast::success("Default address updated")).await,
        Err(e) => warn!(error = %e, "Failed to set default address"),
    }
    Redirect::to("/account")
}

// =============================================================================
// Order history
// =============================================================================

/// An order line as the history page prints it.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub options: Option<String>,
    pub quantity: u32,
    pub line_total: String,
}

/// A past order.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub reference: String,
    pub placed_on: String,
    pub status: String,
    pub status_class: &'static str,
    pub payment: &'static str,
    pub total: String,
    pub lines: Vec<OrderLineView>,
}

impl From<&OrderWithItems> for OrderView {
    fn from(placed: &OrderWithItems) -> Self {
        let order = &placed.order;
        Self {
            reference: order.id.short_code(),
            placed_on: order.created_at.format("%d %b %Y").to_string(),
            status: order.status.label().to_owned(),
            status_class: order.status.badge_class(),
            payment: order.payment_method.label(),
            total: order.total_amount.display(),
            lines: placed
                .items
                .iter()
                .map(|item| {
                    let options = [item.color_name.as_deref(), item.size.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>();
                    OrderLineView {
                        name: item.product_name.clone(),
                        options: (!options.is_empty()).then(|| options.join(", ")),
                        quantity: item.quantity,
                        line_total: item.line_total().display(),
                    }
                })
                .collect(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
}

/// The user's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(user): RequireAuth,
) -> Result<OrdersTemplate, AppError> {
    let orders = OrderRepository::new(state.pool()).list_for_user(user.id).await?;
    Ok(OrdersTemplate {
        layout,
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use akf_core::{Money, OrderId, OrderItemId, OrderStatus, PaymentMethod};

    use super::*;
    use crate::models::{Order, OrderItem};

    fn form() -> AddressForm {
        AddressForm {
            label: " ".to_owned(),
            full_name: "Meera Rao".to_owned(),
            phone: "9876543210".to_owned(),
            address_line1: "12 MG Road".to_owned(),
            address_line2: Some("  ".to_owned()),
            city: "Hyderabad".to_owned(),
            state: "Telangana".to_owned(),
            pincode: "500001".to_owned(),
        }
    }

    #[test]
    fn test_address_form_defaults_label() {
        let address = form().to_address().unwrap();
        assert_eq!(address.label, "Home");
        assert!(address.address_line2.is_none());
    }

    #[test]
    fn test_address_form_requires_fields() {
        let mut missing = form();
        missing.city = "  ".to_owned();
        assert!(missing.to_address().is_none());
    }

    #[test]
    fn test_order_view() {
        let order_id: OrderId = "3f2a9c1e-0b7d-4e55-9a1c-2d3e4f5a6b7c".parse().unwrap();
        let placed = OrderWithItems {
            order: Order {
                id: order_id,
                user_id: None,
                customer_name: "Meera Rao".to_owned(),
                customer_phone: "9876543210".to_owned(),
                customer_email: None,
                customer_address: "12 MG Road, Hyderabad".to_owned(),
                total_amount: Money::from_rupees(3000),
                payment_method: PaymentMethod::Cod,
                status: OrderStatus::Pending,
                payment_screenshot: None,
                created_at: Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap(),
            },
            items: vec![OrderItem {
                id: OrderItemId::new(),
                order_id,
                product_id: "demo-gini-cloth-saree".to_owned(),
                product_name: "Gini Cloth Saree".to_owned(),
                product_price: Money::from_rupees(1500),
                quantity: 2,
                color_name: Some("Teal Blue".to_owned()),
                size: None,
            }],
        };
        let view = OrderView::from(&placed);
        assert_eq!(view.reference, "3F2A9C1E");
        assert_eq!(view.placed_on, "14 Mar 2026");
        assert_eq!(view.payment, "Cash on Delivery");
        assert_eq!(view.lines[0].options.as_deref(), Some("Teal Blue"));
        assert_eq!(view.lines[0].line_total, "₹3,000");
    }
}
