//! Wishlist domain types.

use serde::{Deserialize, Serialize};

use akf_core::ProductKey;

use super::catalog::{ColorVariant, ProductSummary};

/// A saved product in the session wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEntry")]
#[serde(rename_all = "camelCase")]
pub struct LocalWishlistEntry {
    pub product_id: String,
    pub color_variant_id: Option<String>,
    pub color_variant: Option<ColorVariant>,
}

/// Older sessions stored a bare list of product IDs.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Legacy(String),
    #[serde(rename_all = "camelCase")]
    Entry {
        product_id: String,
        #[serde(default)]
        color_variant_id: Option<String>,
        #[serde(default)]
        color_variant: Option<ColorVariant>,
    },
}

impl From<RawEntry> for LocalWishlistEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Legacy(product_id) => Self {
                product_id,
                color_variant_id: None,
                color_variant: None,
            },
            RawEntry::Entry {
                product_id,
                color_variant_id,
                color_variant,
            } => Self {
                product_id,
                color_variant_id,
                color_variant,
            },
        }
    }
}

/// Whether an entry's variant matches the requested one.
///
/// With no variant requested only variant-less entries match.
fn variant_matches(entry: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted {
        Some(id) => entry == Some(id),
        None => entry.is_none(),
    }
}

impl LocalWishlistEntry {
    #[must_use]
    pub fn matches(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.product_id == product_id
            && variant_matches(self.color_variant_id.as_deref(), variant_id)
    }

    /// Stable display ID: `local-<product>` or `local-<product>-<variant>`.
    #[must_use]
    pub fn line_id(&self) -> String {
        self.color_variant_id.as_ref().map_or_else(
            || format!("local-{}", self.product_id),
            |variant| format!("local-{}-{variant}", self.product_id),
        )
    }
}

/// The session-held wishlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalWishlist {
    entries: Vec<LocalWishlistEntry>,
}

impl LocalWishlist {
    #[must_use]
    pub fn entries(&self) -> &[LocalWishlistEntry] {
        &self.entries
    }

    #[must_use]
    pub fn contains(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.entries.iter().any(|e| e.matches(product_id, variant_id))
    }

    pub fn push(&mut self, product_id: &str, variant: Option<&ColorVariant>) {
        self.entries.push(LocalWishlistEntry {
            product_id: product_id.to_owned(),
            color_variant_id: variant.map(|v| v.id.clone()),
            color_variant: variant.cloned(),
        });
    }

    pub fn remove(&mut self, product_id: &str, variant_id: Option<&str>) {
        self.entries.retain(|e| !e.matches(product_id, variant_id));
    }
}

/// A wishlist card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistLine {
    pub id: String,
    pub product: ProductSummary,
    pub color_variant: Option<ColorVariant>,
}

impl WishlistLine {
    #[must_use]
    pub fn color_variant_id(&self) -> Option<&str> {
        self.color_variant.as_ref().map(|v| v.id.as_str())
    }
}

/// The wishlist as the shopper currently sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    pub lines: Vec<WishlistLine>,
}

impl Wishlist {
    #[must_use]
    pub fn contains(&self, product: &ProductKey, variant_id: Option<&str>) -> bool {
        self.lines
            .iter()
            .any(|l| &l.product.key == product && variant_matches(l.color_variant_id(), variant_id))
    }

    /// Whether any colour of `product` is saved (used for the heart on cards).
    #[must_use]
    pub fn contains_any_variant(&self, product: &ProductKey) -> bool {
        self.lines.iter().any(|l| &l.product.key == product)
    }

    #[must_use]
    pub fn total_items(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
