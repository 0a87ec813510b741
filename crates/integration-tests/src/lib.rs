//! Integration tests for the headless demo storefront.
//!
//! These tests drive a running storefront over HTTP and need a reachable
//! commerce backend, so they are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the storefront
//! cargo run -p headless-demo-storefront
//!
//! # Run integration tests against it
//! STOREFRONT_BASE_URL=http://localhost:3000 cargo test -p headless-demo-integration-tests -- --ignored
//! ```

use cookie::Cookie;
use headless_demo_core::TokenBundle;
use reqwest::{Client, Response, header::SET_COOKIE, redirect::Policy};

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A browser-like client: keeps cookies, does not follow redirects.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn browser() -> reqwest::Result<Client> {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
}

/// Token bundles written to the `session` cookie by a response.
#[must_use]
pub fn session_cookies(response: &Response) -> Vec<TokenBundle> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse_encoded(v.to_string()).ok())
        .filter(|c| c.name() == "session" && !c.value().is_empty())
        .filter_map(|c| TokenBundle::from_json(c.value()).ok())
        .collect()
}
