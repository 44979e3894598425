//! Toast notifications sent to the browser in an `HX-Trigger` header.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

impl ToastLevel {
    /// CSS modifier for the toast element.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    /// `HX-Trigger` value firing `events` plus a `toast` event.
    ///
    /// `{"cart-updated":null,"toast":{"level":"success","message":"Added to cart!"}}`
    #[must_use]
    pub fn hx_trigger(&self, events: &[&str]) -> String {
        hx_trigger(Some(self), events)
    }
}

/// `HX-Trigger` value for `events` with an optional toast.
#[must_use]
pub fn hx_trigger(toast: Option<&Toast>, events: &[&str]) -> String {
    let mut map = Map::new();
    for event in events {
        map.insert((*event).to_owned(), Value::Null);
    }
    if let Some(toast) = toast
        && let Ok(value) = serde_json::to_value(toast)
    {
        map.insert("toast".to_owned(), value);
    }
    Value::Object(map).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hx_trigger_payload() {
        let header = Toast::success("Added to cart!").hx_trigger(&["cart-updated"]);
        let value: Value = serde_json::from_str(&header).unwrap();
        assert!(value["cart-updated"].is_null());
        assert_eq!(value["toast"]["level"], "success");
        assert_eq!(value["toast"]["message"], "Added to cart!");
    }

    #[test]
    fn test_hx_trigger_without_toast() {
        assert_eq!(hx_trigger(None, &["wishlist-updated"]), r#"{"wishlist-updated":null}"#);
    }
}
