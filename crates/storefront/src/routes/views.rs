//! View models shared by several templates.
//!
//! Prices are formatted here so templates only print strings.

use crate::models::{CartLine, ProductSummary, Wishlist, WishlistLine};
use crate::services::whatsapp;

/// Shown for products without a picture.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";

/// A product tile in grids and search results.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub key: String,
    pub href: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount: Option<u32>,
    pub image: String,
    pub is_featured: bool,
    pub is_demo: bool,
    pub wishlisted: bool,
    pub enquiry_link: String,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &ProductSummary, wishlist: Option<&Wishlist>, whatsapp_number: &str) -> Self {
        let key = product.key.to_string();
        Self {
            href: format!("/products/{key}"),
            key,
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price.display(),
            original_price: product
                .original_price
                .filter(|o| *o > product.price)
                .map(|o| o.display()),
            discount: product.discount_percent(),
            image: product
                .image_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            is_featured: product.is_featured,
            is_demo: product.key.is_demo(),
            wishlisted: wishlist.is_some_and(|w| w.contains_any_variant(&product.key)),
            enquiry_link: whatsapp::chat_link(
                whatsapp_number,
                &whatsapp::product_enquiry(&product.name),
            ),
        }
    }

    #[must_use]
    pub fn list(
        products: &[ProductSummary],
        wishlist: Option<&Wishlist>,
        whatsapp_number: &str,
    ) -> Vec<Self> {
        products
            .iter()
            .map(|p| Self::new(p, wishlist, whatsapp_number))
            .collect()
    }
}

/// A cart line as the cart page and drawer show it.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub href: String,
    pub name: String,
    pub image: String,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub decrement: u32,
    pub increment: u32,
    pub price: String,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let color = line.options.color.as_ref();
        Self {
            id: line.id.to_string(),
            href: format!("/products/{}", line.product.key),
            name: line.product.name.clone(),
            image: line
                .options
                .color_image()
                .or_else(|| line.product.image_url.clone())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            color_name: color.map(|c| c.name.clone()),
            color_hex: color.and_then(|c| c.hex.clone()),
            size: line.options.size.clone(),
            quantity: line.quantity,
            decrement: line.quantity.saturating_sub(1),
            increment: line.quantity.saturating_add(1),
            price: line.product.price.display(),
            line_total: line.line_total().display(),
        }
    }
}

/// A saved product on the wishlist page.
#[derive(Debug, Clone)]
pub struct WishlistLineView {
    pub id: String,
    pub key: String,
    pub href: String,
    pub name: String,
    pub category: String,
    pub image: String,
    pub price: String,
    pub original_price: Option<String>,
    pub variant_id: Option<String>,
    pub variant_name: Option<String>,
}

impl From<&WishlistLine> for WishlistLineView {
    fn from(line: &WishlistLine) -> Self {
        let product = &line.product;
        let variant = line.color_variant.as_ref();
        Self {
            id: line.id.clone(),
            key: product.key.to_string(),
            href: format!("/products/{}", product.key),
            name: product.name.clone(),
            category: product.category.clone(),
            image: variant
                .map(|v| v.image.clone())
                .or_else(|| product.image_url.clone())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            price: product.price.display(),
            original_price: product
                .original_price
                .filter(|o| *o > product.price)
                .map(|o| o.display()),
            variant_id: variant.map(|v| v.id.clone()),
            variant_name: variant.map(|v| v.name.clone()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use akf_core::{CartItemId, Money};

    use super::*;
    use crate::models::{LineColor, LineOptions};
    use crate::services::catalog::demo;

    #[test]
    fn test_card_shows_discount_against_original() {
        let product = demo::find("demo-kundan-georgette-dress").unwrap().summary();
        let card = ProductCard::new(&product, None, "917680924488");
        assert_eq!(card.price, "₹2,899");
        assert_eq!(card.original_price.as_deref(), Some("₹3,999"));
        assert_eq!(card.discount, Some(28));
        assert!(card.is_demo);
        assert!(!card.wishlisted);
        assert!(card.enquiry_link.contains("Kundan%20Georgette%20Dress"));
    }

    #[test]
    fn test_card_without_image_uses_placeholder() {
        let mut product = demo::find("demo-gini-cloth-saree").unwrap().summary();
        product.image_url = None;
        product.original_price = Some(Money::from_rupees(100));
        let card = ProductCard::new(&product, None, "917680924488");
        assert_eq!(card.image, PLACEHOLDER_IMAGE);
        assert!(card.original_price.is_none());
    }

    #[test]
    fn test_cart_line_prefers_colour_image() {
        let line = CartLine {
            id: CartItemId::new(),
            product: demo::find("demo-gini-cloth-saree").unwrap().summary(),
            quantity: 1,
            options: LineOptions {
                color: Some(LineColor {
                    name: "Teal Blue".to_string(),
                    hex: Some("#008080".to_string()),
                    image: Some("/static/images/products/gini-teal-blue.jpeg".to_string()),
                }),
                size: None,
            },
        };
        let view = CartLineView::from(&line);
        assert_eq!(view.image, "/static/images/products/gini-teal-blue.jpeg");
        assert_eq!(view.decrement, 0);
        assert_eq!(view.increment, 2);
        assert_eq!(view.line_total, "₹1,500");
    }
}
