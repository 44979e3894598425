//! Admin category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use akf_core::CategoryId;

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, ShopperSession};
use crate::models::Category;
use crate::routes::Layout;
use crate::services::toast::Toast;
use crate::state::AppState;

const CATEGORIES_PATH: &str = "/admin/categories";

#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub layout: Layout,
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
}

#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<CategoriesTemplate, AppError> {
    let categories = CategoryRepository::new(state.pool()).list_active().await?;
    Ok(CategoriesTemplate { layout, categories })
}

#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: ShopperSession,
    Form(form): Form<CategoryForm>,
) -> Redirect {
    let name = form.name.trim();
    let toast = if name.is_empty() {
        Toast::error("Please enter a category name")
    } else {
        match CategoryRepository::new(state.pool()).create(name).await {
            Ok(category) => {
                state.catalog_cache().invalidate_categories().await;
                Toast::success(format!("Category \"{}\" has been added", category.name))
            }
            Err(RepositoryError::Conflict(_)) => {
                Toast::error(format!("Category \"{name}\" already exists"))
            }
            Err(e) => {
                warn!(error = %e, "Failed to add category");
                Toast::error("Failed to add category")
            }
        }
    };
    session.flash(&toast).await;
    Redirect::to(CATEGORIES_PATH)
}

/// Deactivates the category; products keep their category text.
#[instrument(skip_all, fields(category_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: ShopperSession,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Redirect {
    let toast = match CategoryRepository::new(state.pool()).deactivate(id).await {
        Ok(()) => {
            state.catalog_cache().invalidate_categories().await;
            Toast::success(format!("\"{}\" has been removed", form.name.trim()))
        }
        Err(e) => {
            warn!(error = %e, "Failed to delete category");
            Toast::error("Failed to delete category")
        }
    };
    session.flash(&toast).await;
    Redirect::to(CATEGORIES_PATH)
}
