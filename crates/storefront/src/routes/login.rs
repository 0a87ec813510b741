//! Return leg of the hosted member login.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::SessionError;
use crate::middleware::session::{
    OAUTH_DATA_COOKIE_NAME, find_cookie, removal_cookie, session_cookie,
};
use crate::state::AppState;
use crate::wix::{OAuthCallback, OAuthData};

use super::store::STORE_PATH;

/// Read the PKCE data stored when the login started.
fn stored_oauth_data(headers: &HeaderMap) -> std::result::Result<OAuthData, SessionError> {
    find_cookie(headers, OAUTH_DATA_COOKIE_NAME)
        .and_then(|value| serde_json::from_str(&value).ok())
        .ok_or(SessionError::MissingOAuthData)
}

/// Only follow `original_uri` back onto this storefront.
fn return_target(state: &AppState, data: &OAuthData) -> String {
    let base = state.config().url_for("/");
    if data.original_uri.starts_with(&base) {
        data.original_uri.clone()
    } else {
        STORE_PATH.to_string()
    }
}

/// Complete a member login.
///
/// Validates `state`, exchanges the code for member tokens and stores them
/// in the `session` cookie. Any failure sends the visitor back to the store
/// with their visitor session untouched.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(callback): Query<OAuthCallback>,
) -> Response {
    let clear_oauth = removal_cookie(OAUTH_DATA_COOKIE_NAME).to_string();

    match complete_login(&state, &headers, &callback).await {
        Ok((session, target)) => {
            add_breadcrumb("auth", "Member logged in", None);
            tracing::info!("Member login completed");
            (
                AppendHeaders([(SET_COOKIE, session), (SET_COOKIE, clear_oauth)]),
                Redirect::to(&target),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Member login failed");
            (
                AppendHeaders([(SET_COOKIE, clear_oauth)]),
                Redirect::to(&format!("{STORE_PATH}?error=login")),
            )
                .into_response()
        }
    }
}

/// Returns the encoded `session` cookie and the page to return to.
async fn complete_login(
    state: &AppState,
    headers: &HeaderMap,
    callback: &OAuthCallback,
) -> Result<(String, String)> {
    let data = stored_oauth_data(headers)?;
    let code = data.authorization_code(callback)?;

    let tokens = state.wix().exchange_code(code, &data).await?;
    if !tokens.is_member() {
        return Err(AppError::Internal("code exchange returned visitor tokens".to_string()));
    }

    let cookie = session_cookie(&tokens, state.config().secure_cookies())?;
    Ok((cookie.encoded().to_string(), return_target(state, &data)))
}
