//! Checkout.
//!
//! Turns the shopper's cart and delivery details into a pending order. Both
//! payment methods are settled by hand: COD on delivery, UPI by an admin
//! checking the uploaded screenshot.

use std::future::Future;

use thiserror::Error;
use tracing::instrument;

use akf_core::{PaymentMethod, UserId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::{Cart, CurrentUser, NewOrder, NewOrderItem, Order, Profile, SavedAddress};

/// Shown when an order cannot be placed for reasons outside the shopper's control.
pub const ORDER_FAILED: &str = "Something went wrong. Please try again or contact support.";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("Please fill all required fields")]
    MissingFields,
    #[error("Please upload payment screenshot")]
    MissingScreenshot,
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CheckoutError {
    /// Text for the error toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty".to_string(),
            Self::MissingFields | Self::MissingScreenshot => self.to_string(),
            Self::Repository(_) => ORDER_FAILED.to_string(),
        }
    }
}

/// Delivery details on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl CustomerDetails {
    /// Starting values for a signed-in shopper.
    ///
    /// Name and phone come from the default saved address, then the profile.
    /// Email is the account's sign-in address; profiles hold no email of their own.
    #[must_use]
    pub fn prefill(
        user: &CurrentUser,
        profile: &Profile,
        default_address: Option<&SavedAddress>,
    ) -> Self {
        let non_empty = |s: Option<&str>| s.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned);
        let name = non_empty(default_address.map(|a| a.full_name.as_str()))
            .or_else(|| non_empty(profile.full_name.as_deref()))
            .unwrap_or_default();
        let phone = non_empty(default_address.map(|a| a.phone.as_str()))
            .or_else(|| non_empty(profile.phone.as_deref()))
            .unwrap_or_default();
        Self {
            name,
            phone,
            email: user.email.to_string(),
            address: default_address.map(SavedAddress::one_line).unwrap_or_default(),
        }
    }

    /// Trimmed copy with the required fields checked.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingFields`] if name, phone or address is blank.
    pub fn validated(&self) -> Result<Self, CheckoutError> {
        let details = Self {
            name: self.name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            email: self.email.trim().to_owned(),
            address: self.address.trim().to_owned(),
        };
        if details.name.is_empty() || details.phone.is_empty() || details.address.is_empty() {
            return Err(CheckoutError::MissingFields);
        }
        Ok(details)
    }
}

/// Check the form and build the order to insert.
///
/// `screenshot` is the stored file name of the UPI payment proof.
///
/// # Errors
///
/// Returns a [`CheckoutError`] for an empty cart, blank required fields, or a
/// UPI order without a screenshot.
pub fn build_order(
    cart: &Cart,
    details: &CustomerDetails,
    user_id: Option<UserId>,
    payment_method: PaymentMethod,
    screenshot: Option<String>,
) -> Result<NewOrder, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let details = details.validated()?;
    if payment_method.requires_screenshot() && screenshot.is_none() {
        return Err(CheckoutError::MissingScreenshot);
    }

    let items = cart
        .lines
        .iter()
        .map(|line| NewOrderItem {
            product_id: line.product.key.to_string(),
            product_name: line.product.name.clone(),
            product_price: line.product.price,
            quantity: line.quantity,
            color_name: line.options.color_name().map(str::to_owned),
            size: line.options.size.clone(),
        })
        .collect();

    Ok(NewOrder {
        user_id,
        customer_name: details.name,
        customer_phone: details.phone,
        customer_email: Some(details.email).filter(|e| !e.is_empty()),
        customer_address: details.address,
        total_amount: cart.total_price(),
        payment_method,
        payment_screenshot: screenshot.filter(|_| payment_method.requires_screenshot()),
        items,
    })
}

/// Order persistence.
pub trait OrderStore: Send + Sync {
    fn create(&self, order: &NewOrder) -> impl Future<Output = Result<Order, RepositoryError>> + Send;
}

impl OrderStore for OrderRepository<'_> {
    async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        Self::create(self, order).await
    }
}

/// Places orders.
pub struct CheckoutService<S> {
    store: S,
}

impl<S: OrderStore> CheckoutService<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate and insert an order with its items.
    ///
    /// The caller clears the cart once this returns.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`build_order`] or a repository error.
    #[instrument(skip(self, cart, details, screenshot), fields(lines = cart.lines.len(), method = %payment_method))]
    pub async fn place_order(
        &self,
        cart: &Cart,
        details: &CustomerDetails,
        user_id: Option<UserId>,
        payment_method: PaymentMethod,
        screenshot: Option<String>,
    ) -> Result<Order, CheckoutError> {
        let order = build_order(cart, details, user_id, payment_method, screenshot)?;
        let created = self.store.create(&order).await?;
        tracing::info!(order_id = %created.id, total = %created.total_amount, "Order placed");
        Ok(created)
    }
}
