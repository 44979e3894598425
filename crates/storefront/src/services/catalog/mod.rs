//! Catalog service.
//!
//! Products come from the database when it holds any active products and
//! from the built-in [`demo`] catalog otherwise. Listing, filtering and
//! sorting behave the same for both sources.

pub mod demo;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{instrument, warn};

use akf_core::{ColorId, Money, ProductKey};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::models::{Category, LineColor, LineOptions, ProductDetail, ProductSummary};

/// Products shown in the home page "New Arrivals" grid.
pub const HOME_LIMIT: usize = 10;

/// Queries shorter than this (after trimming) return nothing.
pub const MIN_SEARCH_LEN: usize = 2;

/// Database matches fetched per search.
const DB_SEARCH_LIMIT: i64 = 6;

/// Results shown in the search dropdown.
pub const SEARCH_LIMIT: usize = 8;

/// Related products on a catalog product page.
const RELATED_LIMIT: i64 = 4;

/// Upper bound of the price slider.
pub const MAX_PRICE_FILTER: u32 = 10_000;

// =============================================================================
// Filtering and sorting
// =============================================================================

/// Category and price-range filter for product listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Money,
    pub max_price: Money,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            min_price: Money::ZERO,
            max_price: Money::from_rupees(MAX_PRICE_FILTER),
        }
    }
}

impl ProductFilter {
    #[must_use]
    pub fn matches(&self, product: &ProductSummary) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|c| product.category == c);
        category_ok && product.price >= self.min_price && product.price <= self.max_price
    }
}

/// Listing sort order, as carried in the `sort` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
    Name,
}

impl ProductSort {
    pub const ALL: [Self; 4] = [Self::Newest, Self::PriceLow, Self::PriceHigh, Self::Name];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Name => "name",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceLow => "Price: Low to High",
            Self::PriceHigh => "Price: High to Low",
            Self::Name => "Name",
        }
    }

    /// Stable sort; demo products have no timestamp and keep catalog order.
    pub fn sort(self, products: &mut [ProductSummary]) {
        products.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(self, a: &ProductSummary, b: &ProductSummary) -> Ordering {
        match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::PriceLow => a.price.cmp(&b.price),
            Self::PriceHigh => b.price.cmp(&a.price),
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    }
}

/// Filter then sort a product list.
#[must_use]
pub fn filter_and_sort(
    products: Vec<ProductSummary>,
    filter: &ProductFilter,
    sort: ProductSort,
) -> Vec<ProductSummary> {
    let mut result: Vec<_> = products.into_iter().filter(|p| filter.matches(p)).collect();
    sort.sort(&mut result);
    result
}

// =============================================================================
// Search
// =============================================================================

/// The trimmed query, or `None` if it is too short to search for.
#[must_use]
pub fn search_term(query: &str) -> Option<&str> {
    let term = query.trim();
    (term.chars().count() >= MIN_SEARCH_LEN).then_some(term)
}

/// Demo products whose name or category contains `term`, ignoring case.
#[must_use]
pub fn demo_matches(term: &str) -> Vec<ProductSummary> {
    let needle = term.to_lowercase();
    demo::all()
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.category.to_lowercase().contains(&needle)
        })
        .map(demo::DemoProduct::summary)
        .collect()
}

/// Database results first, then demo results, without duplicates.
#[must_use]
pub fn merge_search(
    db_results: Vec<ProductSummary>,
    demo_results: Vec<ProductSummary>,
) -> Vec<ProductSummary> {
    let mut seen = HashSet::new();
    db_results
        .into_iter()
        .chain(demo_results)
        .filter(|p| seen.insert(p.key.clone()))
        .take(SEARCH_LIMIT)
        .collect()
}

// =============================================================================
// Variant selection
// =============================================================================

/// What the shopper picked on the product page.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub color_variant: Option<String>,
    pub color: Option<ColorId>,
    pub size: Option<String>,
}

/// Why a product cannot be added to the cart as selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Please select a size")]
    SizeRequired,
    #[error("Please select a color")]
    ColorRequired,
    #[error("Please select a color variant")]
    VariantRequired,
    #[error("This item is out of stock")]
    OutOfStock,
}

/// Check a selection against the product and turn it into line options.
///
/// Unknown sizes, colours or variants count as not selected.
///
/// # Errors
///
/// Returns the first failing check in page order: size, colour, colour
/// variant, stock of the chosen size.
pub fn validate_selection(
    detail: &ProductDetail,
    selection: &Selection,
) -> Result<LineOptions, SelectionError> {
    let size = selection.size.as_deref().and_then(|s| detail.size(s));
    if !detail.sizes.is_empty() && size.is_none() {
        return Err(SelectionError::SizeRequired);
    }

    let color = selection.color.and_then(|id| detail.color(id));
    if !detail.colors.is_empty() && color.is_none() {
        return Err(SelectionError::ColorRequired);
    }

    let variant = selection
        .color_variant
        .as_deref()
        .and_then(|id| detail.color_variant(id));
    if !detail.color_variants.is_empty() && variant.is_none() {
        return Err(SelectionError::VariantRequired);
    }

    if size.is_some_and(|s| !s.in_stock()) {
        return Err(SelectionError::OutOfStock);
    }

    let line_color = variant
        .map(|v| LineColor {
            name: v.name.clone(),
            hex: Some(v.hex_code.clone()),
            image: Some(v.image.clone()),
        })
        .or_else(|| {
            color.map(|c| LineColor {
                name: c.name.clone(),
                hex: Some(c.hex_code.clone()),
                image: None,
            })
        });

    Ok(LineOptions {
        color: line_color,
        size: size.map(|s| s.size.clone()),
    })
}

// =============================================================================
// Cache
// =============================================================================

#[derive(Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Products(Arc<Vec<ProductSummary>>),
}

const CATEGORIES_KEY: &str = "categories";
const ACTIVE_PRODUCTS_KEY: &str = "products:active";

/// Cache of catalog reads that every page needs.
///
/// Entries live for five minutes; admin writes invalidate them at once.
#[derive(Clone)]
pub struct CatalogCache {
    inner: Cache<&'static str, CacheValue>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(16)
                .time_to_live(Duration::from_secs(300))
                .build(),
        }
    }

    pub async fn invalidate_categories(&self) {
        self.inner.invalidate(CATEGORIES_KEY).await;
    }

    pub async fn invalidate_products(&self) {
        self.inner.invalidate(ACTIVE_PRODUCTS_KEY).await;
    }
}

// =============================================================================
// CatalogService
// =============================================================================

/// Catalog reads for storefront pages.
pub struct CatalogService<'a> {
    pool: &'a PgPool,
    cache: &'a CatalogCache,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a CatalogCache) -> Self {
        Self { pool, cache }
    }

    /// Active catalog products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_products(&self) -> Result<Arc<Vec<ProductSummary>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) = self.cache.inner.get(ACTIVE_PRODUCTS_KEY).await
        {
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(self.pool).list_active().await?);
        self.cache
            .inner
            .insert(ACTIVE_PRODUCTS_KEY, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// Products for a listing page.
    ///
    /// Falls back to the demo catalog when the database has no active
    /// products or cannot be reached.
    #[instrument(skip(self))]
    pub async fn listing(&self, filter: &ProductFilter, sort: ProductSort) -> Vec<ProductSummary> {
        let base = match self.active_products().await {
            Ok(products) if !products.is_empty() => products.as_ref().clone(),
            Ok(_) => demo::summaries(),
            Err(e) => {
                warn!(error = %e, "Failed to load products, showing demo catalog");
                demo::summaries()
            }
        };
        filter_and_sort(base, filter, sort)
    }

    /// The home page grid.
    pub async fn new_arrivals(&self, filter: &ProductFilter, sort: ProductSort) -> Vec<ProductSummary> {
        let mut products = self.listing(filter, sort).await;
        products.truncate(HOME_LIMIT);
        products
    }

    /// Featured products, newest first.
    pub async fn featured(&self, limit: usize) -> Vec<ProductSummary> {
        self.listing(&ProductFilter::default(), ProductSort::Newest)
            .await
            .into_iter()
            .filter(|p| p.is_featured)
            .take(limit)
            .collect()
    }

    /// Active categories for the filter dropdown and admin form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.inner.get(CATEGORIES_KEY).await {
            return Ok(categories);
        }

        let categories = Arc::new(CategoryRepository::new(self.pool).list_active().await?);
        self.cache
            .inner
            .insert(CATEGORIES_KEY, CacheValue::Categories(Arc::clone(&categories)))
            .await;
        Ok(categories)
    }

    /// Search-as-you-type results.
    ///
    /// Demo matches are always included after database matches; when the
    /// database fails only demo matches are returned.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Vec<ProductSummary> {
        let Some(term) = search_term(query) else {
            return Vec::new();
        };

        let demo_results = demo_matches(term);
        match ProductRepository::new(self.pool)
            .search_active(term, DB_SEARCH_LIMIT)
            .await
        {
            Ok(db_results) => merge_search(db_results, demo_results),
            Err(e) => {
                warn!(error = %e, "Product search failed, showing demo matches");
                merge_search(Vec::new(), demo_results)
            }
        }
    }

    /// Everything the product page needs.
    ///
    /// Inactive catalog products are treated as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(product = %key))]
    pub async fn detail(&self, key: &ProductKey) -> Result<Option<ProductDetail>, RepositoryError> {
        let id = match key {
            ProductKey::Demo(slug) => return Ok(demo::find(slug).map(demo::DemoProduct::detail)),
            ProductKey::Catalog(id) => *id,
        };

        let products = ProductRepository::new(self.pool);
        let Some(product) = products.get_active(id).await? else {
            return Ok(None);
        };

        let colors = products.colors(id).await?;
        let sizes = products.sizes(id).await?;
        let images = products.images(id).await?;
        let related = products
            .related(id, &product.summary.category, RELATED_LIMIT)
            .await?;

        Ok(Some(ProductDetail {
            product,
            color_variants: Vec::new(),
            colors,
            sizes,
            images,
            related,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Product, ProductColor, ProductSize};
    use akf_core::{ProductId, SizeId};
    use chrono::{TimeZone, Utc};

    fn catalog_product(name: &str, price: u32, day: u32) -> ProductSummary {
        ProductSummary {
            key: ProductKey::Catalog(ProductId::new()),
            name: name.to_string(),
            price: Money::from_rupees(price),
            original_price: None,
            image_url: None,
            category: "Designer Saree".to_string(),
            is_featured: false,
            created_at: Some(Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap()),
        }
    }

    fn names(products: &[ProductSummary]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_default_filter_keeps_demo_catalog() {
        let all = filter_and_sort(demo::summaries(), &ProductFilter::default(), ProductSort::Newest);
        assert_eq!(all.len(), 7);
        assert_eq!(all[0].name, "Cotton Embroidered Dupatta Dress");
    }

    #[test]
    fn test_filter_by_category_and_price() {
        let filter = ProductFilter {
            category: Some("Designer Saree".to_string()),
            min_price: Money::from_rupees(1000),
            max_price: Money::from_rupees(1600),
        };
        let result = filter_and_sort(demo::summaries(), &filter, ProductSort::Name);
        assert_eq!(
            names(&result),
            vec!["Banarasi Silk Saree with Zari Work", "Gini Cloth Saree"]
        );
    }

    #[test]
    fn test_sort_orders() {
        let products = vec![
            catalog_product("b", 500, 1),
            catalog_product("A", 900, 3),
            catalog_product("c", 100, 2),
        ];
        let newest = filter_and_sort(products.clone(), &ProductFilter::default(), ProductSort::Newest);
        assert_eq!(names(&newest), vec!["A", "c", "b"]);
        let low = filter_and_sort(products.clone(), &ProductFilter::default(), ProductSort::PriceLow);
        assert_eq!(names(&low), vec!["c", "b", "A"]);
        let high = filter_and_sort(products.clone(), &ProductFilter::default(), ProductSort::PriceHigh);
        assert_eq!(names(&high), vec!["A", "b", "c"]);
        let by_name = filter_and_sort(products, &ProductFilter::default(), ProductSort::Name);
        assert_eq!(names(&by_name), vec!["A", "b", "c"]);
    }

    #[test]
    fn test_sort_parses_from_query() {
        let sort: ProductSort = serde_json::from_str("\"price-high\"").unwrap();
        assert_eq!(sort, ProductSort::PriceHigh);
        assert_eq!(sort.as_str(), "price-high");
    }

    #[test]
    fn test_search_term_needs_two_chars() {
        assert_eq!(search_term(" s "), None);
        assert_eq!(search_term(" si "), Some("si"));
    }

    #[test]
    fn test_demo_matches_name_or_category() {
        assert_eq!(demo_matches("DAILY").len(), 1);
        assert_eq!(demo_matches("georgette").len(), 2);
        assert!(demo_matches("lehenga").is_empty());
    }

    #[test]
    fn test_merge_search_dedupes_and_caps() {
        let db: Vec<_> = (0..6).map(|i| catalog_product(&format!("p{i}"), 100, 1)).collect();
        let mut demo_results = demo_matches("saree");
        demo_results.push(demo_results[0].clone());
        let merged = merge_search(db, demo_results);
        assert_eq!(merged.len(), SEARCH_LIMIT);
        assert!(!merged[0].key.is_demo());
        assert!(merged[7].key.is_demo());
        assert_ne!(merged[6].key, merged[7].key);
    }

    fn sized_detail(stock: u32) -> ProductDetail {
        let summary = catalog_product("Silk Saree", 1200, 1);
        ProductDetail {
            product: Product {
                summary,
                description: None,
                stock_quantity: stock,
                is_active: true,
            },
            color_variants: Vec::new(),
            colors: vec![ProductColor {
                id: ColorId::new(),
                name: "Maroon".to_string(),
                hex_code: "#800000".to_string(),
            }],
            sizes: vec![ProductSize {
                id: SizeId::new(),
                size: "Free Size".to_string(),
                stock_quantity: stock,
            }],
            images: Vec::new(),
            related: Vec::new(),
        }
    }

    #[test]
    fn test_selection_checks_in_page_order() {
        let detail = sized_detail(3);
        assert_eq!(
            validate_selection(&detail, &Selection::default()),
            Err(SelectionError::SizeRequired)
        );
        let size_only = Selection {
            size: Some("Free Size".to_string()),
            ..Selection::default()
        };
        assert_eq!(
            validate_selection(&detail, &size_only),
            Err(SelectionError::ColorRequired)
        );
        let full = Selection {
            color: Some(detail.colors[0].id),
            ..size_only
        };
        let options = validate_selection(&detail, &full).unwrap();
        assert_eq!(options.color_name(), Some("Maroon"));
        assert_eq!(options.size.as_deref(), Some("Free Size"));
    }

    #[test]
    fn test_selection_rejects_sold_out_size() {
        let detail = sized_detail(0);
        let selection = Selection {
            color: Some(detail.colors[0].id),
            size: Some("Free Size".to_string()),
            ..Selection::default()
        };
        let err = validate_selection(&detail, &selection).unwrap_err();
        assert_eq!(err.to_string(), "This item is out of stock");
    }

    #[test]
    fn test_demo_selection_needs_variant() {
        let detail = demo::find("demo-banarasi-saree").unwrap().detail();
        assert_eq!(
            validate_selection(&detail, &Selection::default()),
            Err(SelectionError::VariantRequired)
        );
        let selection = Selection {
            color_variant: Some("mint".to_string()),
            ..Selection::default()
        };
        let options = validate_selection(&detail, &selection).unwrap();
        assert_eq!(options.color_name(), Some("Mint Green"));
        assert_eq!(
            options.color_image().as_deref(),
            Some("/static/images/products/banarasi-mint.jpeg")
        );
    }
}
