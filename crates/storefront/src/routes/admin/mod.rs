//! Admin panel: dashboard, products, categories and orders.
//!
//! Every handler takes [`RequireAdmin`], which re-checks the role in the
//! database on each request.

pub mod categories;
pub mod orders;
pub mod products;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use akf_core::OrderStatus;

use crate::db::{OrderRepository, ProductRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::Layout;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub product_count: i64,
    pub order_count: i64,
    pub pending_count: i64,
}

#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<DashboardTemplate, AppError> {
    let products = ProductRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let (product_count, order_count, pending_count) = tokio::try_join!(
        products.count(),
        orders.count(),
        orders.count_with_status(OrderStatus::Pending),
    )?;
    Ok(DashboardTemplate {
        layout,
        product_count,
        order_count,
        pending_count,
    })
}
