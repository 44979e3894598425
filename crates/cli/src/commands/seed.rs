//! Seed the product tables from the built-in demo catalog.
//!
//! Seeded products get fresh UUIDs, so carts and wishlists holding `demo-`
//! lines keep pointing at the demo entries until the shopper re-adds them.

use akf_storefront::db::{CategoryRepository, ProductRepository, RepositoryError};
use akf_storefront::services::catalog::demo;
use tracing::{info, warn};

use super::{CommandError, connect};

/// Insert every demo product and its category.
///
/// Skips when products already exist unless `force` is set.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn demo(force: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let products = ProductRepository::new(&pool);
    let categories = CategoryRepository::new(&pool);

    let existing = products.count().await?;
    if existing > 0 && !force {
        warn!(existing, "Products already exist; pass --force to seed anyway");
        return Ok(());
    }

    let mut inserted = 0_usize;
    for product in demo::all() {
        match categories.create(product.category).await {
            Ok(_) | Err(RepositoryError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
        let id = products.create(&product.draft()).await?;
        info!(product_id = %id, "Seeded {}", product.name);
        inserted += 1;
    }

    info!("Seeding complete! {inserted} products inserted");
    Ok(())
}
