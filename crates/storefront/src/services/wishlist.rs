//! Wishlist reconciliation.
//!
//! Demo products are saved in the session wishlist, optionally per colour
//! variant, and work without signing in. Catalog products are saved in
//! `storefront.wishlist_item`, once per product, and need an account.

use std::future::Future;

use tracing::{instrument, warn};

use akf_core::{ProductId, ProductKey, UserId};

use crate::db::{RepositoryError, WishlistRepository};
use crate::models::{ColorVariant, LocalWishlist, Wishlist, WishlistLine};
use crate::services::catalog::demo;
use crate::services::toast::Toast;

const ALREADY_SAVED: &str = "Already in wishlist";
pub const LOGIN_REQUIRED: &str = "Please login to add items to wishlist";
const ADD_FAILED: &str = "Failed to add to wishlist";
const REMOVED: &str = "Removed from wishlist";
const REMOVE_FAILED: &str = "Failed to remove item";

/// Remote wishlist storage.
pub trait WishlistBackend: Send + Sync {
    fn lines(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<WishlistLine>, RepositoryError>> + Send;

    fn insert(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn delete_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

impl WishlistBackend for WishlistRepository<'_> {
    async fn lines(&self, user_id: UserId) -> Result<Vec<WishlistLine>, RepositoryError> {
        Self::lines(self, user_id).await
    }

    async fn insert(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        Self::insert(self, user_id, product_id).await
    }

    async fn delete_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        Self::delete_product(self, user_id, product_id).await
    }
}

/// Wishlist operations for one visitor, signed in or not.
pub struct WishlistService<B> {
    backend: B,
    user_id: Option<UserId>,
}

impl<B: WishlistBackend> WishlistService<B> {
    #[must_use]
    pub const fn new(backend: B, user_id: Option<UserId>) -> Self {
        Self { backend, user_id }
    }

    /// Remote lines first, then session demo lines.
    ///
    /// Guests and failed remote reads see the session lines only.
    #[instrument(skip_all)]
    pub async fn load(&self, local: &LocalWishlist) -> Wishlist {
        let local_lines = local_lines(local);
        let Some(user_id) = self.user_id else {
            return Wishlist { lines: local_lines };
        };

        match self.backend.lines(user_id).await {
            Ok(remote) => Wishlist {
                lines: remote.into_iter().chain(local_lines).collect(),
            },
            Err(e) => {
                warn!(error = %e, "Remote wishlist unavailable, using session wishlist only");
                Wishlist { lines: local_lines }
            }
        }
    }

    /// Save a product, returning the toast to show.
    ///
    /// Unknown demo products are ignored.
    #[instrument(skip_all, fields(product = %product))]
    pub async fn add(
        &self,
        wishlist: &mut Wishlist,
        local: &mut LocalWishlist,
        product: &ProductKey,
        variant: Option<&ColorVariant>,
    ) -> Option<Toast> {
        let product_id = match product {
            ProductKey::Demo(slug) => return add_local(wishlist, local, slug, variant),
            ProductKey::Catalog(id) => *id,
        };

        let Some(user_id) = self.user_id else {
            return Some(Toast::error(LOGIN_REQUIRED));
        };

        if wishlist.contains_any_variant(product) {
            return Some(Toast::info(ALREADY_SAVED));
        }

        match self.backend.insert(user_id, product_id).await {
            Ok(()) => {
                *wishlist = self.load(local).await;
                Some(Toast::success("Added to wishlist!"))
            }
            Err(RepositoryError::Conflict(_)) => Some(Toast::info(ALREADY_SAVED)),
            Err(e) => {
                warn!(error = %e, "Failed to add to remote wishlist");
                Some(Toast::error(ADD_FAILED))
            }
        }
    }

    /// Remove a product (or one colour of a demo product).
    ///
    /// Returns `None` when a guest asks to remove a catalog product.
    #[instrument(skip_all, fields(product = %product))]
    pub async fn remove(
        &self,
        wishlist: &mut Wishlist,
        local: &mut LocalWishlist,
        product: &ProductKey,
        variant_id: Option<&str>,
    ) -> Option<Toast> {
        let product_id = match product {
            ProductKey::Demo(slug) => {
                local.remove(slug, variant_id);
                wishlist
                    .lines
                    .retain(|l| !(&l.product.key == product && same_variant(l, variant_id)));
                return Some(Toast::success(REMOVED));
            }
            ProductKey::Catalog(id) => *id,
        };

        let user_id = self.user_id?;

        wishlist.lines.retain(|l| &l.product.key != product);

        match self.backend.delete_product(user_id, product_id).await {
            Ok(()) => Some(Toast::success(REMOVED)),
            Err(e) => {
                warn!(error = %e, "Failed to remove from remote wishlist");
                *wishlist = self.load(local).await;
                Some(Toast::error(REMOVE_FAILED))
            }
        }
    }
}

fn same_variant(line: &WishlistLine, variant_id: Option<&str>) -> bool {
    match variant_id {
        Some(id) => line.color_variant_id() == Some(id),
        None => line.color_variant_id().is_none(),
    }
}

fn add_local(
    wishlist: &mut Wishlist,
    local: &mut LocalWishlist,
    slug: &str,
    variant: Option<&ColorVariant>,
) -> Option<Toast> {
    if local.contains(slug, variant.map(|v| v.id.as_str())) {
        return Some(Toast::info(ALREADY_SAVED));
    }

    let product = demo::find(slug)?;
    local.push(slug, variant);
    if let Some(entry) = local.entries().last() {
        wishlist.lines.push(WishlistLine {
            id: entry.line_id(),
            product: product
                .summary()
                .with_image(variant.map(|v| v.image.clone())),
            color_variant: variant.cloned(),
        });
    }

    let color_text = variant.map(|v| format!(" ({})", v.name)).unwrap_or_default();
    Some(Toast::success(format!("Added to wishlist!{color_text}")))
}

/// Session entries that name a known demo product.
fn local_lines(local: &LocalWishlist) -> Vec<WishlistLine> {
    local
        .entries()
        .iter()
        .filter_map(|entry| {
            let product = demo::find(&entry.product_id)?;
            Some(WishlistLine {
                id: entry.line_id(),
                product: product
                    .summary()
                    .with_image(entry.color_variant.as_ref().map(|v| v.image.clone())),
                color_variant: entry.color_variant.clone(),
            })
        })
        .collect()
}
