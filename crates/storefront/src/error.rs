//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.

use axum::{
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use thiserror::Error;

use crate::middleware::session::{SESSION_COOKIE_NAME, SessionError, removal_cookie};
use crate::wix::WixError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce API operation failed.
    #[error("Commerce API error: {0}")]
    Wix(#[from] WixError),

    /// Session cookie could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Wix(WixError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Wix(WixError::RateLimited(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Wix(_) => StatusCode::BAD_GATEWAY,
            Self::Session(
                SessionError::Malformed(_)
                | SessionError::Undecodable
                | SessionError::MissingOAuthData,
            )
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(SessionError::Serialize(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) | Self::Session(SessionError::Serialize(_)) => {
                "Internal server error".to_string()
            }
            Self::Wix(WixError::NotFound(_)) => "Not found".to_string(),
            Self::Wix(_) => "External service error".to_string(),
            Self::Session(SessionError::Malformed(_) | SessionError::Undecodable) => {
                "Your session could not be read, please reload the page".to_string()
            }
            _ => self.to_string(),
        };

        // An unreadable session cookie would fail every request; drop it so
        // the next request gets a fresh visitor session
        if matches!(
            self,
            Self::Session(SessionError::Malformed(_) | SessionError::Undecodable)
        ) {
            let removal = removal_cookie(SESSION_COOKIE_NAME).to_string();
            return (status, AppendHeaders([(SET_COOKIE, removal)]), message).into_response();
        }

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for a logged-in member.
pub fn set_sentry_member(member_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(member_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
