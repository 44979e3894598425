//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::catalog::{CatalogCache, CatalogService};
use crate::services::payments::UpiLinks;

/// Cheaply cloneable handle on the shared resources.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog_cache: CatalogCache,
}

impl AppState {
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog_cache: CatalogCache::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn catalog_cache(&self) -> &CatalogCache {
        &self.inner.catalog_cache
    }

    /// Catalog reads through the shared cache.
    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.pool(), self.catalog_cache())
    }

    /// UPI links for the configured payee.
    #[must_use]
    pub fn upi(&self) -> UpiLinks<'_> {
        UpiLinks::new(&self.inner.config.upi, &self.inner.config.store.whatsapp_number)
    }
}
