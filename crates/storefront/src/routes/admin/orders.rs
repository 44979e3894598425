//! Admin order management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use akf_core::{OrderId, OrderStatus};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, ShopperSession};
use crate::models::OrderWithItems;
use crate::routes::Layout;
use crate::routes::account::OrderView;
use crate::routes::products::FilterOption;
use crate::services::payments::screenshot;
use crate::services::toast::Toast;
use crate::state::AppState;

const ORDERS_PATH: &str = "/admin/orders";

/// An order as listed for staff.
#[derive(Debug, Clone)]
pub struct AdminOrderView {
    pub id: String,
    pub summary: OrderView,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub customer_address: String,
    pub placed_at: String,
    pub statuses: Vec<FilterOption>,
    /// Link to the UPI proof, when one was uploaded.
    pub screenshot_url: Option<String>,
}

impl From<&OrderWithItems> for AdminOrderView {
    fn from(placed: &OrderWithItems) -> Self {
        let order = &placed.order;
        Self {
            id: order.id.to_string(),
            summary: OrderView::from(placed),
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            customer_email: order.customer_email.clone(),
            customer_address: order.customer_address.clone(),
            placed_at: order.created_at.format("%d %b %Y, %H:%M").to_string(),
            statuses: OrderStatus::ALL
                .into_iter()
                .map(|status| FilterOption {
                    value: status.as_str().to_owned(),
                    label: status.label().to_owned(),
                    selected: status == order.status,
                })
                .collect(),
            screenshot_url: order
                .payment_screenshot
                .as_ref()
                .map(|_| format!("{ORDERS_PATH}/{}/screenshot", order.id)),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<AdminOrderView>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Every order, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<OrdersTemplate, AppError> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(OrdersTemplate {
        layout,
        orders: orders.iter().map(AdminOrderView::from).collect(),
    })
}

#[instrument(skip_all, fields(order_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: ShopperSession,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    let toast = match form.status.parse::<OrderStatus>() {
        Ok(status) => match OrderRepository::new(state.pool()).update_status(id, status).await {
            Ok(()) => {
                tracing::info!(status = %status, "Order status changed");
                Toast::success(format!(
                    "Status Updated: Order status changed to {}",
                    status.as_str()
                ))
            }
            Err(e) => {
                warn!(error = %e, "Failed to update order status");
                Toast::error("Failed to update order status")
            }
        },
        Err(e) => {
            warn!(error = %e, "Rejected order status");
            Toast::error("Failed to update order status")
        }
    };
    session.flash(&toast).await;
    Redirect::to(ORDERS_PATH)
}

/// Stream the stored UPI payment screenshot.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn screenshot(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound("Screenshot not found".to_owned());

    let placed = OrderRepository::new(state.pool()).get(id).await?.ok_or_else(not_found)?;
    let file_name = placed.order.payment_screenshot.ok_or_else(not_found)?;
    let path = screenshot::stored_path(&state.config().upload_dir, &file_name).ok_or_else(|| {
        AppError::Database(RepositoryError::DataCorruption(format!(
            "stored screenshot name {file_name:?}"
        )))
    })?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(AppError::Internal(format!("reading screenshot: {e}"))),
    };

    Ok((
        [
            (header::CONTENT_TYPE, screenshot::content_type_for(&file_name)),
            (header::CACHE_CONTROL, "private, no-store"),
        ],
        bytes,
    )
        .into_response())
}
