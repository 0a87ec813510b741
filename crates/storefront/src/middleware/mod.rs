//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (fills the span's `request_id`)
//! 4. Security headers
//! 5. Session bootstrap (mints visitor tokens when the cookie is missing)
//!
//! `/static` and `/health` are mounted outside the session bootstrap so asset
//! and probe requests never mint tokens.

pub mod request_id;
pub mod security_headers;
pub mod session;

pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{
    OAUTH_DATA_COOKIE_NAME, SESSION_COOKIE_NAME, SessionError, VisitorSession, session_bootstrap,
};
