//! Shared commerce client: connection pool, endpoints, product cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;

use headless_demo_core::TokenBundle;

use super::cache::{CacheKey, CacheValue};
use super::handle::WixSession;
use super::{WixError, excerpt};
use crate::config::WixConfig;

/// Factory for per-request [`WixSession`] handles.
///
/// Cheap to clone; every clone shares the same HTTP pool and cache.
#[derive(Clone)]
pub struct WixClient {
    inner: Arc<WixClientInner>,
}

struct WixClientInner {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl WixClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &WixConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(WixClientInner {
                http: reqwest::Client::new(),
                base_url: config.api_base_url.trim_end_matches('/').to_string(),
                client_id: config.client_id.clone(),
                cache,
            }),
        }
    }

    /// Bind a handle to one visitor's tokens.
    ///
    /// Passing `None` yields a handle that mints visitor tokens on its first
    /// call.
    #[must_use]
    pub fn session(&self, tokens: Option<TokenBundle>) -> WixSession {
        WixSession::new(self.clone(), tokens)
    }

    /// The OAuth client ID (safe to expose).
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    pub(crate) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }
}

/// Decode a service response, mapping failures onto [`WixError`].
///
/// Empty bodies (e.g. from `DELETE`) decode as `{}`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WixError> {
    let status = response.status();

    // Check for rate limiting
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(WixError::RateLimited(retry_after));
    }

    // Get response body as text first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %excerpt(&body, 500),
            "Commerce API returned non-success status"
        );
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(WixError::NotFound(excerpt(&body, 200)));
        }
        return Err(WixError::Api {
            status: status.as_u16(),
            message: api_error_message(&body),
        });
    }

    let body = if body.trim().is_empty() { "{}" } else { body.as_str() };

    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %excerpt(body, 500),
            "Failed to parse commerce API response"
        );
        WixError::Parse(e)
    })
}

/// Pull `message` out of an error body, falling back to a body excerpt.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| excerpt(body, 200))
}
