//! Visitor session bootstrap and the `session` cookie.
//!
//! Every request must reach a page with a token bundle in the `session`
//! cookie. When the browser did not send one, [`session_bootstrap`] mints
//! visitor tokens and writes the cookie twice:
//!
//! - into the request's `Cookie` header, so the handler for *this* request
//!   sees the session, and
//! - into a `Set-Cookie` response header, so the browser keeps it.
//!
//! Requests that already carry the cookie pass through untouched, even when
//! its value cannot be decoded; the extractor then rejects it. There is
//! no deduplication: concurrent cookie-less requests each mint their own
//! bundle and the browser keeps whichever `Set-Cookie` arrives last.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite};
use thiserror::Error;

use headless_demo_core::{TokenBundle, TokenBundleError};

use crate::error::AppError;
use crate::state::AppState;

/// Cookie holding the serialized token bundle.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Cookie holding PKCE data between login start and callback.
pub const OAUTH_DATA_COOKIE_NAME: &str = "oauthRedirectData";

/// Errors reading session state from cookies.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The `session` cookie does not hold a token bundle.
    #[error("malformed session cookie: {0}")]
    Malformed(#[from] TokenBundleError),

    /// The `session` cookie was sent but its value is not valid
    /// percent-encoding.
    #[error("session cookie could not be decoded")]
    Undecodable,

    /// The OAuth data cookie is missing or unreadable.
    #[error("login state missing or malformed")]
    MissingOAuthData,

    /// The token bundle could not be serialized.
    #[error("failed to serialize cookie: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Session state of the incoming request.
///
/// Absence is its own variant rather than an input to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitorSession {
    /// No `session` cookie was sent.
    Absent,
    /// The cookie parsed to a token bundle.
    Present(TokenBundle),
}

impl VisitorSession {
    /// Read the session from request headers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Malformed` if the cookie exists but does not
    /// hold a valid token bundle, or `SessionError::Undecodable` if its value
    /// cannot be percent-decoded.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, SessionError> {
        match find_cookie(headers, SESSION_COOKIE_NAME) {
            Some(value) => Ok(Self::Present(TokenBundle::from_json(&value)?)),
            None if has_cookie(headers, SESSION_COOKIE_NAME) => Err(SessionError::Undecodable),
            None => Ok(Self::Absent),
        }
    }

    /// The token bundle, if any.
    #[must_use]
    pub fn into_tokens(self) -> Option<TokenBundle> {
        match self {
            Self::Absent => None,
            Self::Present(tokens) => Some(tokens),
        }
    }
}

/// Extractor for the request's [`VisitorSession`].
///
/// Rejects with a 400 (and clears the cookie) when the cookie is malformed.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(State(state): State<AppState>, session: VisitorSession) -> impl IntoResponse {
///     let wix = state.wix().session(session.into_tokens());
///     // ...
/// }
/// ```
impl<S> FromRequestParts<S> for VisitorSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).map_err(|e| {
            tracing::warn!(error = %e, "Rejecting request with unreadable session cookie");
            AppError::Session(e)
        })
    }
}

/// Middleware that guarantees a `session` cookie on every request.
///
/// # Errors
///
/// Returns `AppError::Wix` if visitor tokens cannot be minted. The request
/// does not reach the handler in that case.
pub async fn session_bootstrap(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if has_cookie(request.headers(), SESSION_COOKIE_NAME) {
        return Ok(next.run(request).await);
    }

    let tokens = state.wix().generate_visitor_tokens().await?;
    let cookie = session_cookie(&tokens, state.config().secure_cookies())?;
    tracing::debug!("Minted visitor session");

    // Make the session visible to the handler for this request
    let pair = Cookie::new(SESSION_COOKIE_NAME, cookie.value().to_string());
    request
        .headers_mut()
        .append(COOKIE, header_value(&pair.encoded().to_string())?);

    let mut response = next.run(request).await;

    // A handler that wrote its own session (login, token rotation) wins
    if !sets_cookie(response.headers(), SESSION_COOKIE_NAME) {
        response
            .headers_mut()
            .append(SET_COOKIE, set_cookie_value(&cookie)?);
    }

    Ok(response)
}

/// Whether response headers already set a cookie named `name`.
fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse_encoded(value).ok())
        .any(|cookie| cookie.name() == name)
}

// =============================================================================
// Cookie Helpers
// =============================================================================

/// Parse all `Cookie` headers and return the decoded value of `name`.
#[must_use]
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse_encoded)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// Whether a cookie named `name` was sent, regardless of its value.
///
/// Matches on the raw pair name, so a value that fails to decode still
/// counts as present.
#[must_use]
pub fn has_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('=').map(|(key, _)| key.trim()))
        .any(|key| key == name)
}

/// Build the `session` cookie for a token bundle.
///
/// # Errors
///
/// Returns an error if the bundle cannot be serialized.
pub fn session_cookie(tokens: &TokenBundle, secure: bool) -> Result<Cookie<'static>, SessionError> {
    Ok(app_cookie(SESSION_COOKIE_NAME, tokens.to_json()?, secure))
}

/// Build a cookie with the storefront's attributes.
///
/// No `Max-Age`/`Expires`: cookies live for the browser session.
#[must_use]
pub fn app_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(secure)
        .build()
}

/// Build a cookie that deletes `name` in the browser.
#[must_use]
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    cookie
}

/// Render a cookie as a percent-encoded `Set-Cookie` header value.
///
/// # Errors
///
/// Returns an error if the encoded cookie is not a valid header value.
pub fn set_cookie_value(cookie: &Cookie<'_>) -> Result<HeaderValue, AppError> {
    header_value(&cookie.encoded().to_string())
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))
}
