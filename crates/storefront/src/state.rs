//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, ProductCache, ShoeStoreApi, ShoeStoreClient};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration, the shoe store API and the product cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: Arc<dyn ShoeStoreApi>,
    products: ProductCache,
}

impl AppState {
    /// Create the application state with the production API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = ShoeStoreClient::new(&config.api)?;
        Ok(Self::with_api(config, Arc::new(api)))
    }

    /// Create the application state around any [`ShoeStoreApi`].
    #[must_use]
    pub fn with_api(config: StorefrontConfig, api: Arc<dyn ShoeStoreApi>) -> Self {
        let products = ProductCache::new(config.api.product_cache_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                products,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shoe store API.
    #[must_use]
    pub fn api(&self) -> &dyn ShoeStoreApi {
        self.inner.api.as_ref()
    }

    /// Get a reference to the shared product cache.
    #[must_use]
    pub fn products(&self) -> &ProductCache {
        &self.inner.products
    }
}
