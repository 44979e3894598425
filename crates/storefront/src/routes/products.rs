//! Product listing and product page handlers.

use std::collections::BTreeSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use akf_core::{ColorId, Email, Money, ProductKey};

use crate::db::NotifyRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, ShopperSession};
use crate::models::ProductDetail;
use crate::routes::views::{PLACEHOLDER_IMAGE, ProductCard};
use crate::routes::wishlist::load_wishlist;
use crate::routes::{Layout, back_path, htmx_ack, is_htmx, redirect_with_flash};
use crate::services::catalog::{MAX_PRICE_FILTER, ProductFilter, ProductSort, Selection, demo};
use crate::services::toast::Toast;
use crate::services::whatsapp::{self, ShareLinks};
use crate::state::AppState;

/// Sizes with this many units or fewer show a low-stock hint.
const LOW_STOCK: u32 = 3;

// =============================================================================
// Listing filters
// =============================================================================

/// Query string of the listing pages.
///
/// Fields arrive as raw strings so that empty inputs from the filter form
/// fall back to the defaults instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
}

impl ListingQuery {
    /// Category filter; empty and `all` mean every category.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "all")
    }

    fn price(value: Option<&str>, default: u32) -> u32 {
        value
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map_or(default, |v| v.min(MAX_PRICE_FILTER))
    }

    #[must_use]
    pub fn min_price(&self) -> u32 {
        Self::price(self.min_price.as_deref(), 0)
    }

    #[must_use]
    pub fn max_price(&self) -> u32 {
        Self::price(self.max_price.as_deref(), MAX_PRICE_FILTER)
    }

    #[must_use]
    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            category: self.category().map(str::to_owned),
            min_price: Money::from_rupees(self.min_price()),
            max_price: Money::from_rupees(self.max_price()),
        }
    }

    /// Unknown values sort newest first.
    #[must_use]
    pub fn sort(&self) -> ProductSort {
        self.sort
            .as_deref()
            .and_then(|s| ProductSort::ALL.into_iter().find(|o| o.as_str() == s))
            .unwrap_or_default()
    }
}

/// One `<option>` of a filter dropdown.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// State of the filter bar above a product grid.
#[derive(Debug, Clone)]
pub struct ListingControls {
    /// Where the filter form submits.
    pub action: String,
    pub categories: Vec<FilterOption>,
    pub sorts: Vec<FilterOption>,
    pub min_price: u32,
    pub max_price: u32,
    pub price_limit: u32,
    pub has_active_filters: bool,
}

impl ListingControls {
    pub async fn new(state: &AppState, query: &ListingQuery, action: &str) -> Self {
        let current = query.category();
        let categories = category_names(state)
            .await
            .into_iter()
            .map(|name| FilterOption {
                selected: current == Some(name.as_str()),
                label: name.clone(),
                value: name,
            })
            .collect();
        let sort = query.sort();
        let sorts = ProductSort::ALL
            .into_iter()
            .map(|s| FilterOption {
                value: s.as_str().to_owned(),
                label: s.label().to_owned(),
                selected: s == sort,
            })
            .collect();

        let (min_price, max_price) = (query.min_price(), query.max_price());
        Self {
            action: action.to_owned(),
            categories,
            sorts,
            min_price,
            max_price,
            price_limit: MAX_PRICE_FILTER,
            has_active_filters: current.is_some() || min_price > 0 || max_price < MAX_PRICE_FILTER,
        }
    }
}

/// Active category names, or the demo catalog's while the table is empty.
pub async fn category_names(state: &AppState) -> Vec<String> {
    match state.catalog().categories().await {
        Ok(categories) if !categories.is_empty() => {
            categories.iter().map(|c| c.name.clone()).collect()
        }
        Ok(_) => demo_categories(),
        Err(e) => {
            warn!(error = %e, "Failed to load categories");
            demo_categories()
        }
    }
}

fn demo_categories() -> Vec<String> {
    demo::all()
        .iter()
        .map(|p| p.category.to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// Listing
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
    pub controls: ListingControls,
}

/// Display the full product listing.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    OptionalAuth(user): OptionalAuth,
    session: ShopperSession,
    Query(query): Query<ListingQuery>,
) -> ProductsIndexTemplate {
    let (wishlist, _) = load_wishlist(&state, &session, user.as_ref()).await;
    let products = state.catalog().listing(&query.filter(), query.sort()).await;

    ProductsIndexTemplate {
        products: ProductCard::list(
            &products,
            Some(&wishlist),
            &state.config().store.whatsapp_number,
        ),
        controls: ListingControls::new(&state, &query, "/products").await,
        layout,
    }
}

// =============================================================================
// Product page
// =============================================================================

/// Options picked on the product page, carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub variant: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl SelectionQuery {
    fn non_empty(value: Option<&String>) -> Option<String> {
        value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_owned)
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection {
            color_variant: Self::non_empty(self.variant.as_ref()),
            color: self
                .color
                .as_deref()
                .and_then(|c| c.parse::<ColorId>().ok()),
            size: Self::non_empty(self.size.as_ref()),
        }
    }
}

/// A colour, variant or size chip. Chips are links that update the query.
#[derive(Debug, Clone)]
pub struct OptionChip {
    pub value: String,
    pub label: String,
    pub swatch: Option<String>,
    pub href: String,
    pub selected: bool,
    pub disabled: bool,
    pub note: Option<String>,
}

/// Everything about the product the page prints.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub key: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price: String,
    pub original_price: Option<String>,
    pub discount: Option<u32>,
    pub main_image: String,
    pub gallery: Vec<String>,
    pub in_stock: bool,
    pub is_demo: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
    pub variants: Vec<OptionChip>,
    pub colors: Vec<OptionChip>,
    pub sizes: Vec<OptionChip>,
    /// Hidden form values echoing the current selection.
    pub selected_variant: String,
    pub selected_color: String,
    pub selected_size: String,
    pub selected_variant_name: Option<String>,
    pub selected_out_of_stock: bool,
    pub wishlisted: bool,
    pub whatsapp_order_link: String,
    pub share: ShareLinks,
    pub related: Vec<ProductCard>,
}

struct PageSelection<'a> {
    key: &'a str,
    variant: Option<&'a str>,
    color: Option<ColorId>,
    size: Option<&'a str>,
}

impl PageSelection<'_> {
    /// Product URL with one option replaced.
    fn href(&self, variant: Option<&str>, color: Option<ColorId>, size: Option<&str>) -> String {
        let mut pairs = Vec::new();
        if let Some(v) = variant {
            pairs.push(format!("variant={}", urlencoding::encode(v)));
        }
        if let Some(c) = color {
            pairs.push(format!("color={c}"));
        }
        if let Some(s) = size {
            pairs.push(format!("size={}", urlencoding::encode(s)));
        }
        if pairs.is_empty() {
            format!("/products/{}", self.key)
        } else {
            format!("/products/{}?{}", self.key, pairs.join("&"))
        }
    }
}

fn product_view(detail: &ProductDetail, variant_image: Option<&str>) -> ProductView {
    let summary = &detail.product.summary;
    let mut gallery = detail.images.clone();
    if gallery.is_empty() {
        gallery = if detail.color_variants.is_empty() {
            summary.image_url.iter().cloned().collect()
        } else {
            detail.color_variants.iter().map(|v| v.image.clone()).collect()
        };
    }
    let main_image = variant_image
        .map(str::to_owned)
        .or_else(|| summary.image_url.clone())
        .or_else(|| gallery.first().cloned())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned());

    ProductView {
        key: summary.key.to_string(),
        name: summary.name.clone(),
        category: summary.category.clone(),
        description: detail.product.description.clone(),
        price: summary.price.display(),
        original_price: summary
            .original_price
            .filter(|o| *o > summary.price)
            .map(|o| o.display()),
        discount: summary.discount_percent(),
        main_image,
        gallery,
        in_stock: detail.product.stock_quantity > 0,
        is_demo: summary.key.is_demo(),
    }
}

/// Display a product page.
#[instrument(skip(state, layout, user, session))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    OptionalAuth(user): OptionalAuth,
    session: ShopperSession,
    Path(key): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> Result<ProductShowTemplate, AppError> {
    let not_found = || AppError::NotFound("Product not found".to_owned());
    let key = ProductKey::parse(&key).map_err(|_| not_found())?;
    let detail = state.catalog().detail(&key).await?.ok_or_else(not_found)?;

    let (wishlist, _) = load_wishlist(&state, &session, user.as_ref()).await;
    let selection = query.selection();
    let key_text = key.to_string();

    let variant = selection
        .color_variant
        .as_deref()
        .and_then(|id| detail.color_variant(id));
    let color = selection.color.and_then(|id| detail.color(id));
    let size = selection.size.as_deref().and_then(|s| detail.size(s));

    let page = PageSelection {
        key: &key_text,
        variant: variant.map(|v| v.id.as_str()),
        color: color.map(|c| c.id),
        size: size.map(|s| s.size.as_str()),
    };

    let variants = detail
        .color_variants
        .iter()
        .map(|v| OptionChip {
            value: v.id.clone(),
            label: v.name.clone(),
            swatch: Some(v.hex_code.clone()),
            href: page.href(Some(&v.id), page.color, page.size),
            selected: page.variant == Some(v.id.as_str()),
            disabled: false,
            note: None,
        })
        .collect();
    let colors = detail
        .colors
        .iter()
        .map(|c| OptionChip {
            value: c.id.to_string(),
            label: c.name.clone(),
            swatch: Some(c.hex_code.clone()),
            href: page.href(page.variant, Some(c.id), page.size),
            selected: page.color == Some(c.id),
            disabled: false,
            note: None,
        })
        .collect();
    let sizes = detail
        .sizes
        .iter()
        .map(|s| OptionChip {
            value: s.size.clone(),
            label: s.size.clone(),
            swatch: None,
            href: page.href(page.variant, page.color, Some(&s.size)),
            selected: page.size == Some(s.size.as_str()),
            disabled: !s.in_stock(),
            note: match s.stock_quantity {
                0 => Some("Out of stock".to_owned()),
                n if n <= LOW_STOCK => Some(format!("Only {n} left")),
                _ => None,
            },
        })
        .collect();

    let config = state.config();
    let color_name = variant.map(|v| v.name.as_str()).or(color.map(|c| c.name.as_str()));
    let whatsapp_order_link = whatsapp::chat_link(
        &config.store.whatsapp_number,
        &whatsapp::product_order(&detail, color_name, page.size),
    );
    let url = format!("{}/products/{key_text}", config.base_url.trim_end_matches('/'));
    let share = ShareLinks::new(&detail.product.summary.name, &config.store.name, &url);

    Ok(ProductShowTemplate {
        product: product_view(&detail, variant.map(|v| v.image.as_str())),
        selected_variant: page.variant.unwrap_or_default().to_owned(),
        selected_color: page.color.map(|c| c.to_string()).unwrap_or_default(),
        selected_size: page.size.unwrap_or_default().to_owned(),
        selected_variant_name: variant.map(|v| v.name.clone()),
        selected_out_of_stock: size.is_some_and(|s| !s.in_stock()),
        wishlisted: wishlist.contains_any_variant(&key),
        whatsapp_order_link,
        share,
        related: ProductCard::list(&detail.related, Some(&wishlist), &config.store.whatsapp_number),
        variants,
        colors,
        sizes,
        layout,
    })
}

// =============================================================================
// Back-in-stock requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct NotifyForm {
    pub email: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

pub const NOTIFY_SAVED: &str = "We'll notify you when this is back in stock!";
pub const NOTIFY_FAILED: &str = "Failed to submit request";

/// Record a back-in-stock request.
#[instrument(skip(state, session, headers, form))]
pub async fn notify(
    State(state): State<AppState>,
    session: ShopperSession,
    headers: HeaderMap,
    Path(key): Path<String>,
    Form(form): Form<NotifyForm>,
) -> Response {
    let toast = match (ProductKey::parse(&key), Email::parse(&form.email)) {
        (Err(_), _) => Toast::error(NOTIFY_FAILED),
        (_, Err(_)) => Toast::error("Please enter a valid email address"),
        (Ok(key), Ok(email)) => {
            let size = form.size.as_deref().filter(|s| !s.is_empty());
            let color = form.color.as_deref().filter(|c| !c.is_empty());
            match NotifyRepository::new(state.pool())
                .create(&key.to_string(), &email, size, color)
                .await
            {
                Ok(_) => Toast::success(NOTIFY_SAVED),
                Err(e) => {
                    warn!(error = %e, product = %key, "Failed to save notify request");
                    Toast::error(NOTIFY_FAILED)
                }
            }
        }
    };

    if is_htmx(&headers) {
        return htmx_ack(Some(&toast), &[]);
    }
    redirect_with_flash(&session, Some(&toast), &back_path(&headers, &format!("/products/{key}")))
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(category: &str, min: &str, max: &str, sort: &str) -> ListingQuery {
        ListingQuery {
            category: Some(category.to_owned()),
            min_price: Some(min.to_owned()),
            max_price: Some(max.to_owned()),
            sort: Some(sort.to_owned()),
        }
    }

    #[test]
    fn test_empty_inputs_fall_back_to_defaults() {
        let q = query("", "", "", "");
        assert_eq!(q.filter(), ProductFilter::default());
        assert_eq!(q.sort(), ProductSort::Newest);
        assert_eq!(query("all", "x", "99999", "bogus").filter(), ProductFilter::default());
    }

    #[test]
    fn test_filter_from_query() {
        let q = query("Designer Saree", "500", "1600", "price-high");
        let filter = q.filter();
        assert_eq!(filter.category.as_deref(), Some("Designer Saree"));
        assert_eq!(filter.min_price, Money::from_rupees(500));
        assert_eq!(filter.max_price, Money::from_rupees(1600));
        assert_eq!(q.sort(), ProductSort::PriceHigh);
    }

    #[test]
    fn test_selection_ignores_blank_and_bad_values() {
        let q = SelectionQuery {
            variant: Some(" ".to_owned()),
            color: Some("not-a-uuid".to_owned()),
            size: Some("M".to_owned()),
        };
        let selection = q.selection();
        assert!(selection.color_variant.is_none());
        assert!(selection.color.is_none());
        assert_eq!(selection.size.as_deref(), Some("M"));
    }

    #[test]
    fn test_chip_href_keeps_other_options() {
        let page = PageSelection {
            key: "demo-gini-cloth-saree",
            variant: Some("teal-blue"),
            color: None,
            size: None,
        };
        assert_eq!(
            page.href(page.variant, None, Some("Free Size")),
            "/products/demo-gini-cloth-saree?variant=teal-blue&size=Free%20Size"
        );
        assert_eq!(page.href(None, None, None), "/products/demo-gini-cloth-saree");
    }

    #[test]
    fn test_demo_product_view_uses_variant_gallery() {
        let detail = demo::find("demo-gini-cloth-saree").unwrap().detail();
        let view = product_view(&detail, None);
        assert_eq!(view.gallery.len(), detail.color_variants.len());
        assert!(view.is_demo);
        assert!(view.in_stock);

        let chosen = &detail.color_variants[1].image;
        assert_eq!(&product_view(&detail, Some(chosen)).main_image, chosen);
    }

    #[test]
    fn test_demo_categories_are_distinct() {
        assert_eq!(
            demo_categories(),
            vec!["Daily Wear", "Designer Saree", "Dress Material"]
        );
    }
}
