//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use akf_core::{CategoryId, ColorId, Money, ProductKey, SizeId};

/// The product fields every listing, cart line and wishlist card needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub key: ProductKey,
    pub name: String,
    pub price: Money,
    pub original_price: Option<Money>,
    pub image_url: Option<String>,
    pub category: String,
    pub is_featured: bool,
    /// Unset for demo products, which keep their built-in order.
    pub created_at: Option<DateTime<Utc>>,
}

impl ProductSummary {
    /// Whole-percent saving against the original price.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        self.price.discount_percent(self.original_price)
    }

    /// Copy of this summary showing a different picture.
    #[must_use]
    pub fn with_image(&self, image_url: Option<String>) -> Self {
        Self {
            image_url: image_url.or_else(|| self.image_url.clone()),
            ..self.clone()
        }
    }
}

/// A full product record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub summary: ProductSummary,
    pub description: Option<String>,
    pub stock_quantity: u32,
    pub is_active: bool,
}

/// A photographed colour option of a demo product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorVariant {
    pub id: String,
    pub name: String,
    pub hex_code: String,
    pub image: String,
}

/// A colour swatch on a catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductColor {
    pub id: ColorId,
    pub name: String,
    pub hex_code: String,
}

/// A size with its own stock count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSize {
    pub id: SizeId,
    pub size: String,
    pub stock_quantity: u32,
}

impl ProductSize {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Everything the product page shows.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    /// Demo products only.
    pub color_variants: Vec<ColorVariant>,
    /// Catalog products only.
    pub colors: Vec<ProductColor>,
    pub sizes: Vec<ProductSize>,
    /// Gallery images in display order.
    pub images: Vec<String>,
    pub related: Vec<ProductSummary>,
}

impl ProductDetail {
    #[must_use]
    pub fn color_variant(&self, id: &str) -> Option<&ColorVariant> {
        self.color_variants.iter().find(|v| v.id == id)
    }

    #[must_use]
    pub fn color(&self, id: ColorId) -> Option<&ProductColor> {
        self.colors.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn size(&self, size: &str) -> Option<&ProductSize> {
        self.sizes.iter().find(|s| s.size == size)
    }
}

/// A product category managed from the admin panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A size row on the admin product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeStock {
    pub size: String,
    pub stock_quantity: u32,
}

/// A colour row on the admin product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSwatch {
    pub name: String,
    pub hex_code: String,
}

/// A validated product as submitted from the admin panel.
///
/// Sizes, colours and gallery images replace whatever the product had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub original_price: Option<Money>,
    pub category: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub sizes: Vec<SizeStock>,
    pub colors: Vec<ColorSwatch>,
    pub images: Vec<String>,
}

impl ProductDraft {
    /// Total stock across sizes.
    #[must_use]
    pub fn stock_quantity(&self) -> u32 {
        self.sizes.iter().map(|s| s.stock_quantity).sum()
    }
}
