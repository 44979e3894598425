//! Checkout and order confirmation handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, header::USER_AGENT},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{instrument, warn};

use akf_core::{Money, PaymentMethod};

use crate::db::{AddressRepository, OrderRepository, ProfileRepository};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, ShopperSession};
use crate::models::{Cart, CurrentUser, Profile};
use crate::routes::Layout;
use crate::routes::cart::{CartPanel, cart_service, load_cart};
use crate::services::checkout::{CheckoutError, CheckoutService, CustomerDetails};
use crate::services::payments::{DeviceKind, PaymentScreenshot, UpiApp, qr_svg};
use crate::services::whatsapp;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A button opening one UPI app with the amount filled in.
#[derive(Debug, Clone)]
pub struct AppButton {
    pub label: &'static str,
    pub href: String,
}

/// The UPI half of the payment section.
#[derive(Debug, Clone, Default)]
pub struct UpiPanel {
    pub vpa: String,
    pub amount: String,
    /// Set when no valid link can be built for this amount.
    pub error: Option<String>,
    pub deep_link: Option<String>,
    pub qr_svg: Option<String>,
    /// Shown on phones only.
    pub app_buttons: Vec<AppButton>,
    pub is_mobile: bool,
    pub support_link: String,
}

impl UpiPanel {
    fn new(state: &AppState, total: Money, device: DeviceKind) -> Self {
        let upi = state.upi();
        let support_link = upi.support_link(total, None);
        let mut panel = Self {
            vpa: upi.vpa().to_owned(),
            amount: total.display(),
            is_mobile: device.is_mobile(),
            support_link,
            ..Self::default()
        };

        let link = match upi.deep_link(total.amount(), None) {
            Ok(link) => link,
            Err(e) => {
                panel.error = Some(e.to_string());
                return panel;
            }
        };

        if device.is_mobile() {
            panel.app_buttons = UpiApp::ALL
                .into_iter()
                .filter_map(|app| {
                    upi.app_link(app, total.amount(), None)
                        .ok()
                        .map(|href| AppButton {
                            label: app.label(),
                            href,
                        })
                })
                .collect();
        }
        panel.qr_svg = qr_svg(&link)
            .map_err(|e| warn!(error = %e, "Failed to render UPI QR code"))
            .ok();
        panel.deep_link = Some(link);
        panel
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartPanel,
    pub details: CustomerDetails,
    pub method: String,
    pub upi: UpiPanel,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout/empty.html")]
pub struct CheckoutEmptyTemplate {
    pub layout: Layout,
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct OrderSuccessTemplate {
    pub layout: Layout,
    pub reference: String,
    pub total: String,
    pub payment_label: String,
    pub is_upi: bool,
    pub whatsapp_summary_link: String,
    pub whatsapp_question_link: String,
}

fn device(headers: &HeaderMap) -> DeviceKind {
    DeviceKind::from_user_agent(headers.get(USER_AGENT).and_then(|v| v.to_str().ok()))
}

fn checkout_page(
    state: &AppState,
    layout: Layout,
    headers: &HeaderMap,
    cart: &Cart,
    details: CustomerDetails,
    method: PaymentMethod,
    error: Option<String>,
) -> CheckoutTemplate {
    CheckoutTemplate {
        layout,
        upi: UpiPanel::new(state, cart.total_price(), device(headers)),
        cart: CartPanel::from(cart),
        details,
        method: method.as_str().to_owned(),
        error,
    }
}

/// Contact details for a signed-in shopper, blank for guests.
async fn prefill(state: &AppState, user: Option<&CurrentUser>) -> CustomerDetails {
    let Some(user) = user else {
        return CustomerDetails::default();
    };
    let profile = ProfileRepository::new(state.pool())
        .get(user.id)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load profile for checkout");
            Profile::default()
        });
    let address = AddressRepository::new(state.pool())
        .default_for(user.id)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load default address for checkout");
            None
        });
    CustomerDetails::prefill(user, &profile, address.as_ref())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout form.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    OptionalAuth(user): OptionalAuth,
    session: ShopperSession,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (cart, _) = load_cart(&state, &session).await?;
    if cart.is_empty() {
        return Ok(CheckoutEmptyTemplate { layout }.into_response());
    }
    let details = prefill(&state, user.as_ref()).await;
    Ok(checkout_page(&state, layout, &headers, &cart, details, PaymentMethod::Cod, None).into_response())
}

/// Fields of the multipart checkout form.
#[derive(Debug, Default)]
struct CheckoutForm {
    details: CustomerDetails,
    method: PaymentMethod,
    /// Content type and bytes of the uploaded file, when one was chosen.
    screenshot: Option<(Option<String>, Vec<u8>)>,
}

async fn read_form(mut multipart: Multipart) -> Result<CheckoutForm, AppError> {
    let bad = |e: axum::extract::multipart::MultipartError| AppError::BadRequest(e.body_text());
    let mut form = CheckoutForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "screenshot" => {
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(bad)?;
                if !bytes.is_empty() {
                    form.screenshot = Some((content_type, bytes.to_vec()));
                }
            }
            "payment_method" => {
                form.method = field.text().await.map_err(bad)?.parse().unwrap_or_default();
            }
            "name" => form.details.name = field.text().await.map_err(bad)?,
            "phone" => form.details.phone = field.text().await.map_err(bad)?,
            "email" => form.details.email = field.text().await.map_err(bad)?,
            "address" => form.details.address = field.text().await.map_err(bad)?,
            _ => {}
        }
    }
    Ok(form)
}

/// Place the order.
///
/// UPI orders must carry a payment screenshot; it is validated and stored
/// before the order row is written.
#[instrument(skip_all)]
pub async fn place_order(
    State(state): State<AppState>,
    layout: Layout,
    OptionalAuth(user): OptionalAuth,
    session: ShopperSession,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart).await?;
    let service = cart_service(&state, &session).await?;
    let mut local = session.local_cart().await;
    let mut cart = service.load(&local).await;
    if cart.is_empty() {
        return Ok(CheckoutEmptyTemplate { layout }.into_response());
    }

    let rerender = |layout: Layout, cart: &Cart, form: &CheckoutForm, message: String| {
        checkout_page(&state, layout, &headers, cart, form.details.clone(), form.method, Some(message))
            .into_response()
    };

    let mut stored = None;
    if form.method.requires_screenshot()
        && let Some((content_type, bytes)) = form.screenshot.clone()
    {
        match PaymentScreenshot::validate(content_type.as_deref(), bytes) {
            Ok(screenshot) => stored = Some(screenshot.save(&state.config().upload_dir).await?),
            Err(e) => return Ok(rerender(layout, &cart, &form, e.to_string())),
        }
    }

    let orders = CheckoutService::new(OrderRepository::new(state.pool()));
    let order = match orders
        .place_order(&cart, &form.details, user.as_ref().map(|u| u.id), form.method, stored.clone())
        .await
    {
        Ok(order) => order,
        Err(e) => {
            if let CheckoutError::Repository(ref source) = e {
                tracing::error!(error = %source, "Failed to place order");
            }
            if let Some(name) = stored {
                discard_screenshot(&state, &name).await;
            }
            return Ok(rerender(layout, &cart, &form, e.user_message()));
        }
    };

    add_breadcrumb(
        "checkout",
        "Order placed",
        &[("order_id", &order.id.to_string()), ("method", order.payment_method.as_str())],
    );

    service.clear(&mut cart, &mut local).await;
    session.save_local_cart(&local).await?;
    session.set_last_order(order.id).await?;
    Ok(Redirect::to("/order-success").into_response())
}

async fn discard_screenshot(state: &AppState, name: &str) {
    let path = state.config().upload_dir.join(name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!(error = %e, file = %name, "Failed to remove unused payment screenshot");
    }
}

/// Confirmation page for the order placed in this session.
#[instrument(skip_all)]
pub async fn success(
    State(state): State<AppState>,
    layout: Layout,
    session: ShopperSession,
) -> Result<Response, AppError> {
    let Some(order_id) = session.last_order().await else {
        return Ok(Redirect::to("/").into_response());
    };
    let Some(placed) = OrderRepository::new(state.pool()).get(order_id).await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let number = &state.config().store.whatsapp_number;
    let order = &placed.order;
    Ok(OrderSuccessTemplate {
        layout,
        reference: order.id.short_code(),
        total: order.total_amount.display(),
        payment_label: order.payment_method.label().to_owned(),
        is_upi: order.payment_method == PaymentMethod::Upi,
        whatsapp_summary_link: whatsapp::chat_link(
            number,
            &whatsapp::order_summary(order, &placed.items),
        ),
        whatsapp_question_link: whatsapp::chat_link(number, &whatsapp::order_question(order.id)),
    }
    .into_response())
}
