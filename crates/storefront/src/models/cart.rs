//! Cart domain types.
//!
//! A cart is assembled from two sources: rows in `storefront.cart_item`
//! keyed by the visitor's cart ID, and the [`LocalCart`] kept in the
//! session. Demo products only ever live in the local copy.

use serde::{Deserialize, Serialize};

use akf_core::{CartItemId, Money, ProductKey};

use super::catalog::ProductSummary;

/// The colour a shopper picked for a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColor {
    pub name: String,
    pub hex: Option<String>,
    pub image: Option<String>,
}

/// Variant choices attached to a cart line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineOptions {
    pub color: Option<LineColor>,
    pub size: Option<String>,
}

impl LineOptions {
    /// Whether two lines for the same product should be merged.
    ///
    /// Colours match by name; a line without a colour only matches another
    /// line without one.
    #[must_use]
    pub fn same_choice(&self, other: &Self) -> bool {
        let colors_match = match (&self.color, &other.color) {
            (Some(a), Some(b)) => a.name == b.name,
            (None, None) => true,
            _ => false,
        };
        colors_match && self.size == other.size
    }

    #[must_use]
    pub fn color_name(&self) -> Option<&str> {
        self.color.as_ref().map(|c| c.name.as_str())
    }

    /// Picture of the chosen colour, if it has one.
    #[must_use]
    pub fn color_image(&self) -> Option<String> {
        self.color.as_ref().and_then(|c| c.image.clone())
    }
}

/// A line in the session-held cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCartItem {
    pub id: CartItemId,
    pub product_id: ProductKey,
    pub quantity: u32,
    #[serde(default)]
    pub options: LineOptions,
}

/// The session-held cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalCart {
    items: Vec<LocalCartItem>,
}

impl LocalCart {
    #[must_use]
    pub fn items(&self) -> &[LocalCartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit, merging into a matching line when there is one.
    ///
    /// Returns `true` when an existing line was incremented.
    pub fn increment_or_push(&mut self, product: &ProductKey, options: &LineOptions) -> bool {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| &i.product_id == product && i.options.same_choice(options))
        {
            item.quantity += 1;
            return true;
        }
        self.push(product, options);
        false
    }

    /// Append a new single-unit line.
    pub fn push(&mut self, product: &ProductKey, options: &LineOptions) -> CartItemId {
        let id = CartItemId::new();
        self.items.push(LocalCartItem {
            id,
            product_id: product.clone(),
            quantity: 1,
            options: options.clone(),
        });
        id
    }

    pub fn remove(&mut self, id: CartItemId) {
        self.items.retain(|i| i.id != id);
    }

    /// Returns `true` if the line exists here.
    pub fn set_quantity(&mut self, id: CartItemId, quantity: u32) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// A resolved cart line ready for display and checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: CartItemId,
    pub product: ProductSummary,
    pub quantity: u32,
    pub options: LineOptions,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product.price.times(self.quantity)
    }

    #[must_use]
    pub const fn is_demo(&self) -> bool {
        self.product.key.is_demo()
    }
}

/// The cart as the shopper currently sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of price times quantity.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn line(&self, id: CartItemId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// The line a new unit of `product` with `options` would merge into.
    #[must_use]
    pub fn find_matching(&self, product: &ProductKey, options: &LineOptions) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|l| &l.product.key == product && l.options.same_choice(options))
    }

    pub fn increment(&mut self, id: CartItemId) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == id) {
            line.quantity += 1;
        }
    }

    pub fn set_quantity(&mut self, id: CartItemId, quantity: u32) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == id) {
            line.quantity = quantity;
        }
    }

    pub fn remove(&mut self, id: CartItemId) {
        self.lines.retain(|l| l.id != id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn red() -> LineOptions {
        LineOptions {
            color: Some(LineColor {
                name: "Red".to_string(),
                hex: Some("#B22234".to_string()),
                image: None,
            }),
            size: None,
        }
    }

    fn demo(slug: &str) -> ProductKey {
        ProductKey::Demo(slug.to_string())
    }

    #[test]
    fn test_same_choice_by_colour_name() {
        let mut other_red = red();
        if let Some(c) = other_red.color.as_mut() {
            c.hex = None;
        }
        assert!(red().same_choice(&other_red));
        assert!(!red().same_choice(&LineOptions::default()));
        assert!(LineOptions::default().same_choice(&LineOptions::default()));
    }

    #[test]
    fn test_same_choice_by_size() {
        let m = LineOptions {
            size: Some("M".to_string()),
            ..LineOptions::default()
        };
        let l = LineOptions {
            size: Some("L".to_string()),
            ..LineOptions::default()
        };
        assert!(!m.same_choice(&l));
    }

    #[test]
    fn test_local_cart_merges_matching_lines() {
        let mut cart = LocalCart::default();
        let saree = demo("demo-bandhani-saree");
        assert!(!cart.increment_or_push(&saree, &red()));
        assert!(cart.increment_or_push(&saree, &red()));
        assert!(!cart.increment_or_push(&saree, &LineOptions::default()));
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_local_cart_serialises_as_list() {
        let mut cart = LocalCart::default();
        cart.push(&demo("demo-gini-cloth-saree"), &LineOptions::default());
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        let back: LocalCart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_local_cart_set_quantity_reports_presence() {
        let mut cart = LocalCart::default();
        let id = cart.push(&demo("demo-gini-cloth-saree"), &LineOptions::default());
        assert!(cart.set_quantity(id, 4));
        assert!(!cart.set_quantity(CartItemId::new(), 4));
        assert_eq!(cart.items()[0].quantity, 4);
    }
}
