//! Cart reconciliation.
//!
//! The cart shown to a shopper merges two stores:
//!
//! - remote rows in `storefront.cart_item` keyed by the session's cart ID
//! - the [`LocalCart`] kept in the session
//!
//! Demo products only ever live locally. Catalog products go to the remote
//! store and fall back to the local copy when a remote write fails. Reads
//! prefer remote lines and add local demo lines; local catalog lines are
//! shown only while the remote store is unreachable.
//!
//! Changes are applied to the in-memory view first and never rolled back
//! when the remote write fails.

use std::collections::HashSet;
use std::future::Future;

use tracing::{instrument, warn};

use akf_core::{CartId, CartItemId, ProductId, ProductKey};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{Cart, CartLine, LineOptions, LocalCart, ProductSummary};
use crate::services::catalog::demo;

pub const ADDED: &str = "Added to cart!";
pub const UPDATED: &str = "Updated quantity in cart!";
pub const REMOVED: &str = "Removed from cart";

/// Remote cart storage.
pub trait CartBackend: Send + Sync {
    fn lines(
        &self,
        cart_id: CartId,
    ) -> impl Future<Output = Result<Vec<CartLine>, RepositoryError>> + Send;

    fn insert(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        options: &LineOptions,
    ) -> impl Future<Output = Result<CartItemId, RepositoryError>> + Send;

    /// Only lines belonging to `cart_id` are changed.
    fn set_quantity(
        &self,
        cart_id: CartId,
        id: CartItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Only lines belonging to `cart_id` are deleted.
    fn delete(
        &self,
        cart_id: CartId,
        id: CartItemId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn clear(&self, cart_id: CartId) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Lookup of active catalog products for local cart lines.
pub trait ProductLookup: Send + Sync {
    fn active_by_ids(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<ProductSummary>, RepositoryError>> + Send;
}

impl CartBackend for CartRepository<'_> {
    async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        Self::lines(self, cart_id).await
    }

    async fn insert(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        options: &LineOptions,
    ) -> Result<CartItemId, RepositoryError> {
        Self::insert(self, cart_id, product_id, options).await
    }

    async fn set_quantity(
        &self,
        cart_id: CartId,
        id: CartItemId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        Self::set_quantity(self, cart_id, id, quantity).await
    }

    async fn delete(&self, cart_id: CartId, id: CartItemId) -> Result<(), RepositoryError> {
        Self::delete(self, cart_id, id).await
    }

    async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        Self::clear(self, cart_id).await
    }
}

impl ProductLookup for ProductRepository<'_> {
    async fn active_by_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductSummary>, RepositoryError> {
        Self::active_by_ids(self, ids).await
    }
}

/// Cart operations for one visitor's cart.
pub struct CartService<B, P> {
    backend: B,
    products: P,
    cart_id: CartId,
}

impl<B: CartBackend, P: ProductLookup> CartService<B, P> {
    #[must_use]
    pub const fn new(backend: B, products: P, cart_id: CartId) -> Self {
        Self {
            backend,
            products,
            cart_id,
        }
    }

    /// Build the cart view from both stores.
    #[instrument(skip_all, fields(cart_id = %self.cart_id))]
    pub async fn load(&self, local: &LocalCart) -> Cart {
        match self.backend.lines(self.cart_id).await {
            Ok(remote) => {
                let remote_products: HashSet<&ProductKey> =
                    remote.iter().map(|l| &l.product.key).collect();
                let local_demo: Vec<CartLine> = local_demo_lines(local)
                    .into_iter()
                    .filter(|l| !remote_products.contains(&l.product.key))
                    .collect();
                Cart::new(remote.into_iter().chain(local_demo).collect())
            }
            Err(e) => {
                warn!(error = %e, "Remote cart unavailable, using session cart only");
                Cart::new(self.local_lines(local).await)
            }
        }
    }

    /// Add one unit of a product and return the toast text.
    ///
    /// `cart` is replaced by a fresh [`load`](Self::load) afterwards.
    #[instrument(skip_all, fields(cart_id = %self.cart_id, product = %product))]
    pub async fn add(
        &self,
        cart: &mut Cart,
        local: &mut LocalCart,
        product: &ProductKey,
        options: &LineOptions,
    ) -> &'static str {
        let existing = cart
            .find_matching(product, options)
            .map(|l| (l.id, l.quantity));

        match existing {
            Some((id, _)) => cart.increment(id),
            None => {
                if let Some(line) = demo_line(CartItemId::new(), product, 1, options) {
                    cart.lines.push(line);
                }
            }
        }

        let message = match product {
            ProductKey::Demo(_) => {
                if local.increment_or_push(product, options) {
                    UPDATED
                } else {
                    ADDED
                }
            }
            ProductKey::Catalog(id) => self.add_remote(*id, existing, local, product, options).await,
        };

        *cart = self.load(local).await;
        message
    }

    async fn add_remote(
        &self,
        product_id: ProductId,
        existing: Option<(CartItemId, u32)>,
        local: &mut LocalCart,
        product: &ProductKey,
        options: &LineOptions,
    ) -> &'static str {
        if let Some((line_id, quantity)) = existing {
            return match self.backend.set_quantity(self.cart_id, line_id, quantity + 1).await {
                Ok(()) => UPDATED,
                Err(e) => {
                    warn!(error = %e, "Remote quantity update failed, using session cart");
                    local.increment_or_push(product, options);
                    ADDED
                }
            };
        }

        if let Err(e) = self.backend.insert(self.cart_id, product_id, options).await {
            warn!(error = %e, "Remote cart insert failed, using session cart");
            local.push(product, options);
        }
        ADDED
    }

    /// Remove a line and return the toast text.
    #[instrument(skip_all, fields(cart_id = %self.cart_id, line = %id))]
    pub async fn remove(
        &self,
        cart: &mut Cart,
        local: &mut LocalCart,
        id: CartItemId,
    ) -> &'static str {
        let is_remote = cart.line(id).is_some_and(|l| !l.is_demo());

        cart.remove(id);
        local.remove(id);

        if is_remote && let Err(e) = self.backend.delete(self.cart_id, id).await {
            warn!(error = %e, "Remote cart delete failed");
        }
        REMOVED
    }

    /// Set a line's quantity; anything below one removes the line.
    ///
    /// Returns the toast text when the line was removed.
    #[instrument(skip_all, fields(cart_id = %self.cart_id, line = %id))]
    pub async fn update_quantity(
        &self,
        cart: &mut Cart,
        local: &mut LocalCart,
        id: CartItemId,
        quantity: i64,
    ) -> Option<&'static str> {
        if quantity < 1 {
            return Some(self.remove(cart, local, id).await);
        }
        let Ok(quantity) = u32::try_from(quantity) else {
            return None;
        };

        let is_remote = cart.line(id).is_some_and(|l| !l.is_demo());

        cart.set_quantity(id, quantity);
        local.set_quantity(id, quantity);

        if is_remote && let Err(e) = self.backend.set_quantity(self.cart_id, id, quantity).await {
            warn!(error = %e, "Remote quantity update failed");
        }
        None
    }

    /// Empty the cart in both stores.
    #[instrument(skip_all, fields(cart_id = %self.cart_id))]
    pub async fn clear(&self, cart: &mut Cart, local: &mut LocalCart) {
        cart.clear();
        local.clear();

        if let Err(e) = self.backend.clear(self.cart_id).await {
            warn!(error = %e, "Remote cart clear failed");
        }
    }

    /// Every resolvable local line, in session order.
    ///
    /// Catalog lines are dropped when the product lookup fails.
    async fn local_lines(&self, local: &LocalCart) -> Vec<CartLine> {
        let catalog_ids: Vec<ProductId> = local
            .items()
            .iter()
            .filter_map(|i| i.product_id.catalog_id())
            .collect();

        let catalog = if catalog_ids.is_empty() {
            Vec::new()
        } else {
            match self.products.active_by_ids(&catalog_ids).await {
                Ok(products) => products,
                Err(e) => {
                    warn!(error = %e, "Product lookup for session cart failed");
                    Vec::new()
                }
            }
        };

        local
            .items()
            .iter()
            .filter_map(|item| match &item.product_id {
                ProductKey::Demo(_) => {
                    demo_line(item.id, &item.product_id, item.quantity, &item.options)
                }
                ProductKey::Catalog(_) => catalog
                    .iter()
                    .find(|p| p.key == item.product_id)
                    .map(|p| CartLine {
                        id: item.id,
                        product: p.clone(),
                        quantity: item.quantity,
                        options: item.options.clone(),
                    }),
            })
            .collect()
    }
}

fn local_demo_lines(local: &LocalCart) -> Vec<CartLine> {
    local
        .items()
        .iter()
        .filter_map(|item| demo_line(item.id, &item.product_id, item.quantity, &item.options))
        .collect()
}

/// A demo product line, showing the chosen colour's photo when there is one.
fn demo_line(
    id: CartItemId,
    product: &ProductKey,
    quantity: u32,
    options: &LineOptions,
) -> Option<CartLine> {
    let ProductKey::Demo(slug) = product else {
        return None;
    };
    let demo = demo::find(slug)?;
    Some(CartLine {
        id,
        product: demo.summary().with_image(options.color_image()),
        quantity,
        options: options.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use akf_core::Money;

    use super::*;
    use crate::models::LineColor;

    /// In-memory remote cart that can be switched into failure mode.
    #[derive(Default)]
    struct FakeBackend {
        rows: Mutex<Vec<(CartId, CartLine)>>,
        products: Vec<ProductSummary>,
        failing: AtomicBool,
        failing_quantity: AtomicBool,
    }

    impl FakeBackend {
        fn with_products(products: Vec<ProductSummary>) -> Self {
            Self {
                products,
                ..Self::default()
            }
        }

        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), RepositoryError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }

        /// Fail only quantity updates, leaving reads and inserts working.
        fn fail_quantity(&self, failing: bool) {
            self.failing_quantity.store(failing, Ordering::SeqCst);
        }

        fn check_quantity(&self) -> Result<(), RepositoryError> {
            self.check()?;
            if self.failing_quantity.load(Ordering::SeqCst) {
                Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }

        fn quantity_of(&self, id: CartItemId) -> Option<u32> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|(_, l)| l.id == id)
                .map(|(_, l)| l.quantity)
        }

        fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    impl CartBackend for &FakeBackend {
        async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
            self.check()?;
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| *c == cart_id)
                .map(|(_, l)| l.clone())
                .collect())
        }

        async fn insert(
            &self,
            cart_id: CartId,
            product_id: ProductId,
            options: &LineOptions,
        ) -> Result<CartItemId, RepositoryError> {
            self.check()?;
            let product = self
                .products
                .iter()
                .find(|p| p.key == ProductKey::Catalog(product_id))
                .cloned()
                .ok_or(RepositoryError::NotFound)?;
            let id = CartItemId::new();
            self.rows.lock().unwrap().push((
                cart_id,
                CartLine {
                    id,
                    product,
                    quantity: 1,
                    options: options.clone(),
                },
            ));
            Ok(id)
        }

        async fn set_quantity(
            &self,
            cart_id: CartId,
            id: CartItemId,
            quantity: u32,
        ) -> Result<(), RepositoryError> {
            self.check_quantity()?;
            let mut rows = self.rows.lock().unwrap();
            let (_, line) = rows
                .iter_mut()
                .find(|(c, l)| *c == cart_id && l.id == id)
                .ok_or(RepositoryError::NotFound)?;
            line.quantity = quantity;
            Ok(())
        }

        async fn delete(&self, cart_id: CartId, id: CartItemId) -> Result<(), RepositoryError> {
            self.check()?;
            self.rows
                .lock()
                .unwrap()
                .retain(|(c, l)| *c != cart_id || l.id != id);
            Ok(())
        }

        async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
            self.check()?;
            self.rows.lock().unwrap().retain(|(c, _)| *c != cart_id);
            Ok(())
        }
    }

    impl ProductLookup for &FakeBackend {
        async fn active_by_ids(
            &self,
            ids: &[ProductId],
        ) -> Result<Vec<ProductSummary>, RepositoryError> {
            Ok(self
                .products
                .iter()
                .filter(|p| p.key.catalog_id().is_some_and(|id| ids.contains(&id)))
                .cloned()
                .collect())
        }
    }

    fn saree(price: u32) -> ProductSummary {
        ProductSummary {
            key: ProductKey::Catalog(ProductId::new()),
            name: "Kanjivaram Silk Saree".to_string(),
            price: Money::from_rupees(price),
            original_price: None,
            image_url: Some("/uploads/kanjivaram.jpeg".to_string()),
            category: "Designer Saree".to_string(),
            is_featured: false,
            created_at: None,
        }
    }

    fn demo_key() -> ProductKey {
        ProductKey::Demo("demo-banarasi-saree".to_string())
    }

    fn mint() -> LineOptions {
        LineOptions {
            color: Some(LineColor {
                name: "Mint Green".to_string(),
                hex: Some("#7EBDB4".to_string()),
                image: Some("/static/images/products/banarasi-mint.jpeg".to_string()),
            }),
            size: None,
        }
    }

    fn service(backend: &FakeBackend) -> CartService<&FakeBackend, &FakeBackend> {
        CartService::new(backend, backend, CartId::new())
    }

    #[tokio::test]
    async fn test_demo_product_stays_local() {
        let backend = FakeBackend::default();
        let cart_service = service(&backend);
        let mut local = LocalCart::default();
        let mut cart = cart_service.load(&local).await;

        let msg = cart_service.add(&mut cart, &mut local, &demo_key(), &mint()).await;
        assert_eq!(msg, ADDED);
        let msg = cart_service.add(&mut cart, &mut local, &demo_key(), &mint()).await;
        assert_eq!(msg, UPDATED);

        assert_eq!(backend.row_count(), 0);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(
            cart.lines[0].product.image_url.as_deref(),
            Some("/static/images/products/banarasi-mint.jpeg")
        );
        assert_eq!(cart.total_price(), Money::from_rupees(3000));
    }

    #[tokio::test]
    async fn test_catalog_product_goes_remote() {
        let product = saree(1200);
        let backend = FakeBackend::with_products(vec![product.clone()]);
        let cart_service = service(&backend);
        let mut local = LocalCart::default();
        let mut cart = cart_service.load(&local).await;
        let options = LineOptions::default();

        assert_eq!(cart_service.add(&mut cart, &mut local, &product.key, &options).await, ADDED);
        assert_eq!(cart_service.add(&mut cart, &mut local, &product.key, &options).await, UPDATED);

        assert!(local.is_empty());
        assert_eq!(backend.row_count(), 1);
        assert_eq!(cart.total_items(), 2);
    }

    #[tokio::test]
    async fn test_insert_failure_falls_back_to_session() {
        let product = saree(800);
        let backend = FakeBackend::with_products(vec![product.clone()]);
        let cart_service = service(&backend);
        let mut local = LocalCart::default();
        let mut cart = Cart::default();

        backend.fail(true);
        let msg = cart_service
            .add(&mut cart, &mut local, &product.key, &LineOptions::default())
            .await;
        assert_eq!(msg, ADDED);
        assert_eq!(local.items().len(), 1);
        // Remote down: the session copy of the catalog line is shown.
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].product.name, "Kanjivaram Silk Saree");

        // Remote back: local catalog lines are hidden again.
        backend.fail(false);
        let cart = cart_service.load(&local).await;
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_load_merges_remote_and_local_demo() {
        let product = saree(1200);
        let backend = FakeBackend::with_products(vec![product.clone()]);
        let cart_service = service(&backend);
        let mut local = LocalCart::default();
        let mut cart = Cart::default();

        cart_service
            .add(&mut cart, &mut local, &product.key, &LineOptions::default())
            .await;
        cart_service.add(&mut cart, &mut local, &demo_key(), &mint()).await;

        let cart = cart_service.load(&local).await;
        assert_eq!(cart.lines.len(), 2);
        assert!(!cart.lines[0].is_demo());
        assert!(cart.lines[1].is_demo());
        assert_eq!(cart.total_price(), Money::from_rupees(2700));
    }

    #[tokio::test]
    async fn test_remove_is_optimistic() {
        let product = saree(500);
        let backend = FakeBackend::with_products(vec![product.clone()]);
        let cart_service = service(&backend);
        let mut local = LocalCart::default();
        let mut cart = Cart::default();
        cart_service
            .add(&mut cart, &mut local, &product.key, &LineOptions::default())
            .await;
        let id = cart.lines[0].id;

        backend.fail(true);
        let msg = cart_service.remove(&mut cart, &mut local, id).await;
        assert_eq!(msg, REMOVED);
        assert!(cart.is_empty());
        assert_eq!(backend.row_count(), 1);
    }

    #[tokio::test]
    async fn test_update_quantity_below_one_removes() {
        let backend = FakeBackend::default();
        let cart_service = service(&backend);
        let mut local = LocalCart::default();
        let mut cart = Cart::default();
        cart_service.add(&mut cart, &mut local, &demo_key(), &mint()).await;
        let id = cart.lines[0].id;

        assert_eq!(
            cart_service.update_quantity(&mut cart, &mut local, id, 3).await,
            None
        );
        assert_eq!(cart.total_items(), 3);
        assert_eq!(local.items()[0].quantity, 3);

        assert_eq!(
            cart_service.update_quantity(&mut cart, &mut local, id, 0).await,
            Some(REMOVED)
        );
        assert!(cart.is_empty());
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn test_clear_empties_both_stores() {
        let product = saree(500);
        let backend = FakeBackend::with_products(vec![product.clone()]);
        let cart_service = service(&backend);
        let mut local = LocalCart::default();
        let mut cart = Cart::default();
        cart_service
            .add(&mut cart, &mut local, &product.key, &LineOptions::default())
            .await;
        cart_service.add(&mut cart, &mut local, &demo_key(), &mint()).await;

        cart_service.clear(&mut cart, &mut local).await;
        assert!(cart.is_empty());
        assert!(local.is_empty());
        assert_eq!(backend.row_count(), 0);
    }

    #[tokio::test]
    async fn test_other_carts_lines_are_untouched() {
        let product = saree(1500);
        let backend = FakeBackend::with_products(vec![product.clone()]);
        let owner = service(&backend);
        let mut owner_local = LocalCart::default();
        let mut owner_cart = Cart::default();
        owner
            .add(&mut owner_cart, &mut owner_local, &product.key, &LineOptions::default())
            .await;
        let line = owner_cart.lines[0].id;

        let other = service(&backend);
        let mut other_local = LocalCart::default();
        let mut other_cart = other.load(&other_local).await;
        assert!(other_cart.is_empty());

        assert_eq!(
            other
                .update_quantity(&mut other_cart, &mut other_local, line, 50)
                .await,
            None
        );
        assert_eq!(backend.quantity_of(line), Some(1));

        other.remove(&mut other_cart, &mut other_local, line).await;
        assert_eq!(backend.row_count(), 1);

        let owner_cart = owner.load(&owner_local).await;
        assert_eq!(owner_cart.total_items(), 1);
    }

    #[tokio::test]
    async fn test_unknown_line_is_not_sent_remote() {
        let product = saree(700);
        let backend = FakeBackend::with_products(vec![product.clone()]);
        let cart_service = service(&backend);
        let mut local = LocalCart::default();
        let mut cart = Cart::default();
        cart_service
            .add(&mut cart, &mut local, &product.key, &LineOptions::default())
            .await;

        let stray = CartItemId::new();
        assert_eq!(
            cart_service.update_quantity(&mut cart, &mut local, stray, 4).await,
            None
        );
        assert_eq!(cart_service.remove(&mut cart, &mut local, stray).await, REMOVED);
        assert_eq!(cart.total_items(), 1);
        assert_eq!(backend.row_count(), 1);
    }

    #[tokio::test]
    async fn test_increment_failure_falls_back_to_session() {
        let product = saree(900);
        let backend = FakeBackend::with_products(vec![product.clone()]);
        let cart_service = service(&backend);
        let mut local = LocalCart::default();
        let mut cart = Cart::default();
        let options = LineOptions::default();
        cart_service.add(&mut cart, &mut local, &product.key, &options).await;
        let line = cart.lines[0].id;

        backend.fail_quantity(true);
        let msg = cart_service.add(&mut cart, &mut local, &product.key, &options).await;
        assert_eq!(msg, ADDED);
        assert_eq!(backend.quantity_of(line), Some(1));
        assert_eq!(local.items().len(), 1);
        assert_eq!(local.items()[0].product_id, product.key);
    }
}
