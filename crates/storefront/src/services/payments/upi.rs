//! UPI deep links.
//!
//! Links follow the NPCI `upi://pay` format:
//!
//! ```text
//! upi://pay?pa=<vpa>&pn=<payee name>&am=<amount, 2dp>&cu=INR&tn=<note>
//! ```
//!
//! The amount is part of the link so the payer's app shows it read-only.
//! App buttons (PhonePe, Google Pay, Paytm) reuse the same query string
//! under the app's own scheme.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use qrcode::QrCode;
use qrcode::render::svg;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use url::form_urlencoded;

use akf_core::Money;

use crate::config::UpiConfig;
use crate::services::whatsapp;

/// Prefix of every transaction note.
const NOTE_PREFIX: &str = "AKF-";

/// Order references shorter than this are rejected.
const MIN_ORDER_REF_LEN: usize = 4;

/// Characters of the order reference kept in notes and messages.
const SHORT_REF_LEN: usize = 8;

static VPA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.\-_]{2,256}@[a-zA-Z]{2,64}$").expect("Invalid regex")
});

static MOBILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
        .expect("Invalid regex")
});

/// One problem with a payment request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpiError {
    #[error("Invalid UPI configuration. Please contact support.")]
    InvalidConfig,
    #[error("Amount must be greater than zero")]
    NotPositive,
    #[error("Minimum amount is {0}")]
    BelowMinimum(String),
    #[error("Maximum amount is {0}")]
    AboveMaximum(String),
    #[error("Amount can have maximum 2 decimal places")]
    TooManyDecimals,
    #[error("Invalid order reference")]
    InvalidOrderReference,
}

/// Every problem found with a payment request, shown joined by ". ".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct InvalidPaymentRequest {
    pub errors: Vec<UpiError>,
}

impl fmt::Display for InvalidPaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join(". "))
    }
}

/// UPI apps with their own URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpiApp {
    PhonePe,
    GPay,
    Paytm,
    Generic,
}

impl UpiApp {
    /// Buttons shown on mobile, generic last.
    pub const ALL: [Self; 4] = [Self::PhonePe, Self::GPay, Self::Paytm, Self::Generic];

    const fn scheme(self) -> &'static str {
        match self {
            Self::PhonePe => "phonepe://pay?",
            Self::GPay => "tez://upi/pay?",
            Self::Paytm => "paytmmp://pay?",
            Self::Generic => "upi://pay?",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PhonePe => "PhonePe",
            Self::GPay => "Google Pay",
            Self::Paytm => "Paytm",
            Self::Generic => "Other UPI App",
        }
    }
}

/// Mobile operating system, for app-specific instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileOs {
    Android,
    Ios,
    Unknown,
}

/// The shopper's device class, read from the `User-Agent` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Mobile(MobileOs),
    Desktop,
}

impl DeviceKind {
    #[must_use]
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return Self::Desktop;
        };
        if !MOBILE_PATTERN.is_match(ua) {
            return Self::Desktop;
        }
        let lower = ua.to_lowercase();
        let os = if lower.contains("android") {
            MobileOs::Android
        } else if ["iphone", "ipad", "ipod"].iter().any(|d| lower.contains(d)) {
            MobileOs::Ios
        } else {
            MobileOs::Unknown
        };
        Self::Mobile(os)
    }

    /// App buttons only work where a UPI app can be installed.
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile(_))
    }
}

/// How a payment was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    App(UpiApp),
    QrScan,
}

/// A record of a payment attempt, kept with the placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReference {
    pub order_id: String,
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
    pub channel: PaymentChannel,
}

impl OrderReference {
    #[must_use]
    pub fn new(order_id: impl Into<String>, amount: Money, channel: PaymentChannel) -> Self {
        Self {
            order_id: order_id.into(),
            amount,
            timestamp: Utc::now(),
            channel,
        }
    }
}

/// Whether `vpa` looks like `name@provider`.
#[must_use]
pub fn validate_vpa(vpa: &str) -> bool {
    VPA_PATTERN.is_match(vpa.trim())
}

/// First few characters of an order ID, upper-cased.
#[must_use]
pub fn short_ref(order_ref: &str) -> String {
    order_ref.chars().take(SHORT_REF_LEN).collect::<String>().to_uppercase()
}

/// Upper-case base-36 rendering of `n`.
fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[usize::try_from(n % 36).unwrap_or(0)]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn format_limit(amount: Decimal) -> String {
    Money::new(amount).map_or_else(|_| amount.to_string(), |m| m.display())
}

/// Payment-link builder for the configured payee.
pub struct UpiLinks<'a> {
    config: &'a UpiConfig,
    support_number: &'a str,
}

impl<'a> UpiLinks<'a> {
    #[must_use]
    pub const fn new(config: &'a UpiConfig, support_number: &'a str) -> Self {
        Self {
            config,
            support_number,
        }
    }

    #[must_use]
    pub fn vpa(&self) -> &str {
        &self.config.vpa
    }

    /// All problems with `amount`, in check order.
    #[must_use]
    pub fn validate_amount(&self, amount: Decimal) -> Vec<UpiError> {
        let mut errors = Vec::new();
        if amount <= Decimal::ZERO {
            errors.push(UpiError::NotPositive);
        }
        if amount < self.config.min_amount {
            errors.push(UpiError::BelowMinimum(format_limit(self.config.min_amount)));
        }
        if amount > self.config.max_amount {
            errors.push(UpiError::AboveMaximum(format_limit(self.config.max_amount)));
        }
        if amount.normalize().scale() > 2 {
            errors.push(UpiError::TooManyDecimals);
        }
        errors
    }

    /// All problems with a payment request.
    #[must_use]
    pub fn validate_request(&self, amount: Decimal, order_ref: Option<&str>) -> Vec<UpiError> {
        let mut errors = Vec::new();
        if !validate_vpa(&self.config.vpa) {
            errors.push(UpiError::InvalidConfig);
        }
        errors.extend(self.validate_amount(amount));
        if order_ref.is_some_and(|r| !r.is_empty() && r.chars().count() < MIN_ORDER_REF_LEN) {
            errors.push(UpiError::InvalidOrderReference);
        }
        errors
    }

    /// `AKF-<order>` for a usable reference, else `AKF-<base36 millis>`.
    #[must_use]
    pub fn transaction_note(order_ref: Option<&str>, now: DateTime<Utc>) -> String {
        match order_ref {
            Some(r) if r.chars().count() >= MIN_ORDER_REF_LEN => {
                format!("{NOTE_PREFIX}{}", short_ref(r))
            }
            _ => {
                let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
                format!("{NOTE_PREFIX}{}", to_base36(millis))
            }
        }
    }

    fn query(&self, amount: Decimal, order_ref: Option<&str>, now: DateTime<Utc>) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("pa", &self.config.vpa)
            .append_pair("pn", &self.config.merchant_name)
            .append_pair("am", &format!("{:.2}", amount.round_dp(2)))
            .append_pair("cu", &self.config.currency)
            .append_pair("tn", &Self::transaction_note(order_ref, now))
            .finish()
    }

    /// The generic `upi://pay` link.
    ///
    /// # Errors
    ///
    /// Returns every validation problem when the request is invalid.
    pub fn deep_link(
        &self,
        amount: Decimal,
        order_ref: Option<&str>,
    ) -> Result<String, InvalidPaymentRequest> {
        self.app_link(UpiApp::Generic, amount, order_ref)
    }

    /// A link opening a specific UPI app.
    ///
    /// # Errors
    ///
    /// Returns every validation problem when the request is invalid.
    pub fn app_link(
        &self,
        app: UpiApp,
        amount: Decimal,
        order_ref: Option<&str>,
    ) -> Result<String, InvalidPaymentRequest> {
        self.app_link_at(app, amount, order_ref, Utc::now())
    }

    fn app_link_at(
        &self,
        app: UpiApp,
        amount: Decimal,
        order_ref: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, InvalidPaymentRequest> {
        let errors = self.validate_request(amount, order_ref);
        if !errors.is_empty() {
            return Err(InvalidPaymentRequest { errors });
        }
        Ok(format!("{}{}", app.scheme(), self.query(amount, order_ref, now)))
    }

    /// WhatsApp link asking the shop for help with a payment.
    #[must_use]
    pub fn support_link(&self, amount: Money, order_ref: Option<&str>) -> String {
        let reference = order_ref.map_or_else(|| "NEW".to_owned(), short_ref);
        let message = format!(
            "Hi, I need help with my UPI payment of {} for Order #{reference}",
            amount.display()
        );
        whatsapp::chat_link(self.support_number, &message)
    }
}

/// Pixel size of the checkout QR code.
const QR_SIZE: u32 = 200;

/// SVG QR code encoding a payment link.
///
/// # Errors
///
/// Returns an error if the link is too long to encode.
pub fn qr_svg(link: &str) -> Result<String, qrcode::types::QrError> {
    let code = QrCode::new(link.as_bytes())?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .quiet_zone(true)
        .build())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn links(config: &UpiConfig) -> UpiLinks<'_> {
        UpiLinks::new(config, "917680924488")
    }

    fn instant() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_767_225_600_000).unwrap()
    }

    #[test]
    fn test_validate_vpa() {
        assert!(validate_vpa("8897393151@ybl"));
        assert!(validate_vpa("  shop.name-1@okaxis "));
        assert!(!validate_vpa("a@ybl"));
        assert!(!validate_vpa("shop@y"));
        assert!(!validate_vpa("shop@ybl1"));
        assert!(!validate_vpa("shopybl"));
    }

    #[test]
    fn test_amount_errors_accumulate() {
        let config = UpiConfig::default();
        let upi = links(&config);
        assert!(upi.validate_amount(Decimal::new(150_000, 2)).is_empty());
        assert_eq!(
            upi.validate_amount(Decimal::ZERO),
            vec![UpiError::NotPositive, UpiError::BelowMinimum("₹1".to_string())]
        );
        assert_eq!(
            upi.validate_amount(Decimal::new(1_000_001, 1)),
            vec![UpiError::AboveMaximum("₹1,00,000".to_string())]
        );
        assert_eq!(
            upi.validate_amount(Decimal::new(10_005, 3)),
            vec![UpiError::TooManyDecimals]
        );
    }

    #[test]
    fn test_deep_link_format() {
        let config = UpiConfig::default();
        let link = links(&config)
            .app_link_at(UpiApp::Generic, Decimal::from(1500), Some("3f2a9c1d-aaaa"), instant())
            .unwrap();
        assert_eq!(
            link,
            "upi://pay?pa=8897393151%40ybl&pn=AK+Fashion+Hub&am=1500.00&cu=INR&tn=AKF-3F2A9C1D"
        );
    }

    #[test]
    fn test_app_links_share_query() {
        let config = UpiConfig::default();
        let upi = links(&config);
        let generic = upi
            .app_link_at(UpiApp::Generic, Decimal::from(900), None, instant())
            .unwrap();
        let query = generic.trim_start_matches("upi://pay?");
        for (app, scheme) in [
            (UpiApp::PhonePe, "phonepe://pay?"),
            (UpiApp::GPay, "tez://upi/pay?"),
            (UpiApp::Paytm, "paytmmp://pay?"),
        ] {
            let link = upi.app_link_at(app, Decimal::from(900), None, instant()).unwrap();
            assert_eq!(link, format!("{scheme}{query}"));
        }
    }

    #[test]
    fn test_transaction_note_fallback_uses_base36_time() {
        let note = UpiLinks::transaction_note(None, instant());
        assert_eq!(note, format!("AKF-{}", to_base36(1_767_225_600_000)));
        assert_eq!(UpiLinks::transaction_note(Some("ab"), instant()), note);
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_invalid_request_joins_messages() {
        let config = UpiConfig {
            vpa: "broken".to_string(),
            ..UpiConfig::default()
        };
        let err = links(&config)
            .deep_link(Decimal::from(-5), Some("abc"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid UPI configuration. Please contact support.. Amount must be greater than zero. \
             Minimum amount is ₹1. Invalid order reference"
        );
    }

    #[test]
    fn test_device_detection() {
        let android = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        let desktop = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
        assert_eq!(
            DeviceKind::from_user_agent(Some(android)),
            DeviceKind::Mobile(MobileOs::Android)
        );
        assert_eq!(
            DeviceKind::from_user_agent(Some(iphone)),
            DeviceKind::Mobile(MobileOs::Ios)
        );
        assert!(!DeviceKind::from_user_agent(Some(desktop)).is_mobile());
        assert!(!DeviceKind::from_user_agent(None).is_mobile());
    }

    #[test]
    fn test_support_link() {
        let config = UpiConfig::default();
        let link = links(&config).support_link(Money::from_rupees(2899), None);
        assert!(link.starts_with("https://wa.me/917680924488?text="));
        assert!(link.contains("Order%20%23NEW"));
        assert!(link.contains("%E2%82%B92%2C899"));
    }

    #[test]
    fn test_qr_svg_renders() {
        let svg = qr_svg("upi://pay?pa=8897393151%40ybl&am=1500.00&cu=INR").unwrap();
        assert!(svg.contains("<svg"));
    }
}
