//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                    - Example catalog
//! GET  /store               - Products, cart summary, member name
//! POST /store/cart/add      - Add a product (first choice of every option)
//! POST /store/cart/clear    - Delete the current cart
//! POST /store/checkout      - Redirect to hosted checkout
//! POST /store/login         - Redirect to hosted member login
//! GET  /login-callback      - Finish member login
//! GET  /health              - Liveness probe (no session)
//! ```

pub mod catalog;
pub mod login;
pub mod store;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(store::show))
        .route("/cart/add", post(store::add_to_cart))
        .route("/cart/clear", post(store::clear_cart))
        .route("/checkout", post(store::checkout))
        .route("/login", post(store::login))
}

/// Create all page routes for the storefront.
///
/// These run behind the session bootstrap middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .nest("/store", store_routes())
        .route(store::LOGIN_CALLBACK_PATH, get(login::callback))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the commerce API.
pub async fn health() -> &'static str {
    "ok"
}
