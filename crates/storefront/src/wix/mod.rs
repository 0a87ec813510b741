//! REST client for the headless commerce service.
//!
//! # Architecture
//!
//! - [`WixClient`] is the long-lived, cheaply cloneable factory held in
//!   application state. It owns the HTTP connection pool, the OAuth client ID
//!   and a short-lived product cache. It performs token endpoint calls.
//! - [`WixSession`] is a per-request handle bound explicitly to one visitor's
//!   [`TokenBundle`](headless_demo_core::TokenBundle). All data operations
//!   (catalog query, products, cart, checkout, redirects, members) go through
//!   it. There is no shared handle between requests.
//!
//! The service is the source of truth for products, carts and members; this
//! crate keeps no copy beyond the product cache (5 minute TTL).
//!
//! # Example
//!
//! ```rust,ignore
//! use headless_demo_storefront::wix::WixClient;
//!
//! let client = WixClient::new(&config.wix);
//! let tokens = client.generate_visitor_tokens().await?;
//!
//! let session = client.session(Some(tokens));
//! let products = session.query_products().await?;
//! let cart = session.add_to_current_cart(&products[0]).await?;
//! ```

mod auth;
mod cache;
mod client;
mod handle;
pub mod types;

pub use auth::{OAuthCallback, OAuthData};
pub use client::WixClient;
pub use handle::{WixSession, line_item_for};

use thiserror::Error;

/// Errors that can occur when talking to the commerce service.
#[derive(Debug, Error)]
pub enum WixError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message or body excerpt.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Token issuance, refresh or code exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),
}

/// Keep at most `limit` characters of a response body for logs and errors.
pub(crate) fn excerpt(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}
