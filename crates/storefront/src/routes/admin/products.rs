//! Admin product management.
//!
//! The form is plain HTML. Sizes, colours and gallery images are edited as
//! one entry per line:
//!
//! ```text
//! sizes:   M: 4           colours: Teal Blue #008080      images: https://…/1.jpg
//!          L: 2                    Maroon #7F1D1D                 https://…/2.jpg
//! ```

use std::sync::LazyLock;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use regex::Regex;
use serde::Deserialize;
use tracing::{instrument, warn};

use akf_core::{Money, ProductId};

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, ShopperSession};
use crate::models::{ColorSwatch, Product, ProductDraft, SizeStock};
use crate::routes::Layout;
use crate::routes::products::category_names;
use crate::services::toast::Toast;
use crate::state::AppState;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid regex"));

/// Quick-pick sizes shown next to the sizes box.
pub const PRESET_SIZES: [&str; 6] = ["S", "M", "L", "XL", "2XL", "3XL"];

/// Quick-pick colours shown next to the colours box.
pub const PRESET_COLORS: [(&str, &str); 14] = [
    ("Black", "#000000"),
    ("White", "#FFFFFF"),
    ("Red", "#EF4444"),
    ("Blue", "#3B82F6"),
    ("Green", "#22C55E"),
    ("Yellow", "#EAB308"),
    ("Orange", "#F97316"),
    ("Purple", "#A855F7"),
    ("Pink", "#EC4899"),
    ("Gray", "#6B7280"),
    ("Brown", "#92400E"),
    ("Navy", "#1E3A5F"),
    ("Maroon", "#7F1D1D"),
    ("Beige", "#D4C4A8"),
];

// =============================================================================
// Form
// =============================================================================

/// The product form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub original_price: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    /// Checkbox: present when ticked.
    pub is_active: Option<String>,
    pub is_featured: Option<String>,
    #[serde(default)]
    pub sizes: String,
    #[serde(default)]
    pub colors: String,
    #[serde(default)]
    pub images: String,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// `M: 4`, `M 4` or a bare `M` (no stock yet).
fn parse_size(line: &str) -> Result<SizeStock, String> {
    let (size, stock) = match line.rsplit_once([':', ' ']) {
        Some((size, stock)) if !size.trim().is_empty() => (size.trim(), stock.trim()),
        _ => (line, "0"),
    };
    let stock_quantity = stock
        .parse::<u32>()
        .map_err(|_| format!("Invalid stock for size {size}: {stock}"))?;
    Ok(SizeStock {
        size: size.to_owned(),
        stock_quantity,
    })
}

/// `Teal Blue #008080`.
fn parse_color(line: &str) -> Result<ColorSwatch, String> {
    let (name, hex) = line
        .rsplit_once(' ')
        .map(|(n, h)| (n.trim(), h.trim()))
        .filter(|(n, h)| !n.is_empty() && HEX_COLOR.is_match(h))
        .ok_or_else(|| format!("Colour must be a name and a hex code: {line}"))?;
    Ok(ColorSwatch {
        name: name.to_owned(),
        hex_code: hex.to_uppercase(),
    })
}

impl ProductForm {
    /// Validate the form into a draft.
    ///
    /// # Errors
    ///
    /// Returns the first problem as a message for the form.
    pub fn to_draft(&self) -> Result<ProductDraft, String> {
        let name = non_empty(&self.name).ok_or("Product name is required")?;
        let category = non_empty(&self.category).ok_or("Please choose a category")?;
        let price = Money::parse(&self.price).map_err(|_| "Please enter a valid price")?;
        let original_price = match non_empty(&self.original_price) {
            Some(text) => {
                Some(Money::parse(&text).map_err(|_| "Please enter a valid original price")?)
            }
            None => None,
        };

        let sizes = lines(&self.sizes).map(parse_size).collect::<Result<Vec<_>, _>>()?;
        let colors = lines(&self.colors).map(parse_color).collect::<Result<Vec<_>, _>>()?;

        Ok(ProductDraft {
            name,
            description: non_empty(&self.description),
            price,
            original_price,
            category,
            image_url: non_empty(&self.image_url),
            is_active: self.is_active.is_some(),
            is_featured: self.is_featured.is_some(),
            sizes,
            colors,
            images: lines(&self.images).map(str::to_owned).collect(),
        })
    }

    /// Form values for editing an existing product.
    fn from_product(
        product: &Product,
        sizes: &[crate::models::ProductSize],
        colors: &[crate::models::ProductColor],
        images: &[String],
    ) -> Self {
        let summary = &product.summary;
        let checkbox = |on: bool| on.then(|| "on".to_owned());
        Self {
            name: summary.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: summary.price.to_fixed_2(),
            original_price: summary
                .original_price
                .map(|p| p.to_fixed_2())
                .unwrap_or_default(),
            category: summary.category.clone(),
            image_url: summary.image_url.clone().unwrap_or_default(),
            is_active: checkbox(product.is_active),
            is_featured: checkbox(summary.is_featured),
            sizes: sizes
                .iter()
                .map(|s| format!("{}: {}", s.size, s.stock_quantity))
                .collect::<Vec<_>>()
                .join("\n"),
            colors: colors
                .iter()
                .map(|c| format!("{} {}", c.name, c.hex_code))
                .collect::<Vec<_>>()
                .join("\n"),
            images: images.join("\n"),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// A row of the admin product table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub price: String,
    pub stock: u32,
    pub is_active: bool,
    pub is_featured: bool,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        let summary = &product.summary;
        Self {
            id: summary
                .key
                .catalog_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            name: summary.name.clone(),
            category: summary.category.clone(),
            image: summary.image_url.clone(),
            price: summary.price.display_rounded(),
            stock: product.stock_quantity,
            is_active: product.is_active,
            is_featured: summary.is_featured,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductsTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    /// Form target: `/admin/products` or `/admin/products/{id}`.
    pub action: String,
    pub is_new: bool,
    pub form: ProductForm,
    pub categories: Vec<String>,
    pub preset_sizes: [&'static str; 6],
    pub preset_colors: [(&'static str, &'static str); 14],
    pub error: Option<String>,
}

impl ProductFormTemplate {
    async fn new(
        state: &AppState,
        layout: Layout,
        id: Option<ProductId>,
        form: ProductForm,
        error: Option<String>,
    ) -> Self {
        Self {
            layout,
            action: id.map_or_else(|| "/admin/products".to_owned(), |id| format!("/admin/products/{id}")),
            is_new: id.is_none(),
            form,
            categories: category_names(state).await,
            preset_sizes: PRESET_SIZES,
            preset_colors: PRESET_COLORS,
            error,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Product table, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<ProductsTemplate, AppError> {
    let products = ProductRepository::new(state.pool()).list_all().await?;
    Ok(ProductsTemplate {
        layout,
        products: products.iter().map(ProductRow::from).collect(),
    })
}

/// Blank form; new products start active.
#[instrument(skip_all)]
pub async fn new(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_admin): RequireAdmin,
) -> ProductFormTemplate {
    let form = ProductForm {
        is_active: Some("on".to_owned()),
        ..ProductForm::default()
    };
    ProductFormTemplate::new(&state, layout, None, form, None).await
}

#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_admin): RequireAdmin,
    session: ShopperSession,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return Ok(ProductFormTemplate::new(&state, layout, None, form, Some(message))
                .await
                .into_response());
        }
    };

    match ProductRepository::new(state.pool()).create(&draft).await {
        Ok(id) => {
            tracing::info!(product_id = %id, "Product added");
            state.catalog_cache().invalidate_products().await;
            session
                .flash(&Toast::success("Product Added: The product has been added successfully."))
                .await;
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(e) => {
            warn!(error = %e, "Failed to add product");
            let message = Some("Failed to add product".to_owned());
            Ok(ProductFormTemplate::new(&state, layout, None, form, message)
                .await
                .into_response())
        }
    }
}

#[instrument(skip_all, fields(product_id = %id))]
pub async fn edit(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate, AppError> {
    let products = ProductRepository::new(state.pool());
    let product = products
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;
    let sizes = products.sizes(id).await?;
    let colors = products.colors(id).await?;
    let images = products.images(id).await?;

    let form = ProductForm::from_product(&product, &sizes, &colors, &images);
    Ok(ProductFormTemplate::new(&state, layout, Some(id), form, None).await)
}

#[instrument(skip_all, fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_admin): RequireAdmin,
    session: ShopperSession,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return Ok(ProductFormTemplate::new(&state, layout, Some(id), form, Some(message))
                .await
                .into_response());
        }
    };

    match ProductRepository::new(state.pool()).update(id, &draft).await {
        Ok(()) => {
            state.catalog_cache().invalidate_products().await;
            session
                .flash(&Toast::success(
                    "Product Updated: The product has been updated successfully.",
                ))
                .await;
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(e) => {
            warn!(error = %e, "Failed to update product");
            let message = Some("Failed to update product".to_owned());
            Ok(ProductFormTemplate::new(&state, layout, Some(id), form, message)
                .await
                .into_response())
        }
    }
}

#[instrument(skip_all, fields(product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: ShopperSession,
    Path(id): Path<ProductId>,
) -> Redirect {
    let toast = match ProductRepository::new(state.pool()).delete(id).await {
        Ok(true) => {
            state.catalog_cache().invalidate_products().await;
            Toast::success("Product Deleted: Product has been removed successfully.")
        }
        Ok(false) => Toast::error("Product not found"),
        Err(e) => {
            warn!(error = %e, "Failed to delete product");
            Toast::error("Failed to delete product")
        }
    };
    session.flash(&toast).await;
    Redirect::to("/admin/products")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: " Pattu Silk Saree ".to_owned(),
            price: "1800".to_owned(),
            original_price: "2100.00".to_owned(),
            category: "Designer Saree".to_owned(),
            is_active: Some("on".to_owned()),
            sizes: "M: 4\n\nL 2\nFree Size".to_owned(),
            colors: "Leaf Green #4a7c4e\nRed #B22234".to_owned(),
            images: "https://img.example/1.jpg\n  \nhttps://img.example/2.jpg".to_owned(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_form_to_draft() {
        let draft = form().to_draft().unwrap();
        assert_eq!(draft.name, "Pattu Silk Saree");
        assert_eq!(draft.original_price, Some(Money::from_rupees(2100)));
        assert!(draft.is_active);
        assert!(!draft.is_featured);
        assert!(draft.description.is_none());
        assert_eq!(
            draft.sizes,
            vec![
                SizeStock { size: "M".to_owned(), stock_quantity: 4 },
                SizeStock { size: "L".to_owned(), stock_quantity: 2 },
                SizeStock { size: "Free Size".to_owned(), stock_quantity: 0 },
            ]
        );
        assert_eq!(draft.stock_quantity(), 6);
        assert_eq!(draft.colors[0].hex_code, "#4A7C4E");
        assert_eq!(draft.images.len(), 2);
    }

    #[test]
    fn test_form_errors() {
        let mut missing_name = form();
        missing_name.name = "  ".to_owned();
        assert_eq!(missing_name.to_draft().unwrap_err(), "Product name is required");

        let mut bad_price = form();
        bad_price.price = "abc".to_owned();
        assert_eq!(bad_price.to_draft().unwrap_err(), "Please enter a valid price");

        let mut bad_color = form();
        bad_color.colors = "Green".to_owned();
        assert!(bad_color.to_draft().unwrap_err().starts_with("Colour must be"));

        let mut bad_stock = form();
        bad_stock.sizes = "M: many".to_owned();
        assert!(bad_stock.to_draft().unwrap_err().starts_with("Invalid stock"));
    }
}
