//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::ProductCatalog;
use crate::config::StorefrontConfig;
use crate::db::JsonStore;
use crate::services::auth::AuthService;
use crate::services::rate_limit::RateLimiter;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the data store, catalog and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: JsonStore,
    catalog: ProductCatalog,
    rate_limiter: RateLimiter,
}

impl AppState {
    /// Create state with a freshly generated catalog.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let catalog = ProductCatalog::generate(config.product_count);
        Self::with_catalog(config, catalog)
    }

    /// Create state around an existing catalog.
    #[must_use]
    pub fn with_catalog(config: StorefrontConfig, catalog: ProductCatalog) -> Self {
        let store = JsonStore::new(&config.data_dir);
        let rate_limiter = RateLimiter::new(config.rate_limits);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                catalog,
                rate_limiter,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the flat-file data store.
    #[must_use]
    pub fn store(&self) -> &JsonStore {
        &self.inner.store
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the auth attempt limiter.
    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.rate_limiter
    }

    /// Build an auth service over the shared store.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.store, self.inner.config.session_ttl)
    }
}
