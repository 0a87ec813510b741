//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::wix::WixClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. It holds configuration and the
/// commerce client factory; it never holds per-visitor tokens.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    wix: WixClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let wix = WixClient::new(&config.wix);

        Self {
            inner: Arc::new(AppStateInner { config, wix }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce client factory.
    #[must_use]
    pub fn wix(&self) -> &WixClient {
        &self.inner.wix
    }
}
