//! Token bundle issued by the commerce service's OAuth endpoint.
//!
//! The bundle is stored verbatim (as JSON) in the `session` cookie, so the
//! serialized shape matches what the commerce SDK writes:
//!
//! ```json
//! {
//!   "accessToken": { "value": "...", "expiresAt": 1700000000 },
//!   "refreshToken": { "value": "...", "role": "visitor" }
//! }
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// Seconds subtracted from `expiresAt` when deciding whether to refresh.
const EXPIRY_BUFFER_SECONDS: i64 = 60;

/// Errors that can occur when parsing a [`TokenBundle`].
#[derive(thiserror::Error, Debug)]
pub enum TokenBundleError {
    /// The input is not valid bundle JSON.
    #[error("invalid token bundle JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A required credential value is empty.
    #[error("token bundle {0} is empty")]
    EmptyValue(&'static str),
}

/// Scope of a token bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenRole {
    /// Anonymous site visitor.
    #[default]
    Visitor,
    /// Logged-in site member.
    Member,
    /// Tokens with no identity attached.
    None,
}

/// Short-lived credential sent with every API request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub value: String,
    /// Unix timestamp (seconds) after which the token is rejected.
    pub expires_at: i64,
}

/// Long-lived credential used to mint new access tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub value: String,
    #[serde(default)]
    pub role: TokenRole,
}

/// An access/refresh credential pair for a visitor or member session.
///
/// `Debug` is implemented manually so credential values never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

impl TokenBundle {
    /// Build a bundle from a raw OAuth token response.
    ///
    /// `expires_in` is relative to `now` (both in seconds).
    #[must_use]
    pub fn issued(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
        role: TokenRole,
        now: i64,
    ) -> Self {
        Self {
            access_token: AccessToken {
                value: access_token.into(),
                expires_at: now.saturating_add(expires_in),
            },
            refresh_token: RefreshToken {
                value: refresh_token.into(),
                role,
            },
        }
    }

    /// Parse a bundle from its cookie JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a JSON bundle object or if the
    /// refresh token value is empty. Literal `null` is rejected.
    pub fn from_json(input: &str) -> Result<Self, TokenBundleError> {
        let bundle: Self = serde_json::from_str(input)?;
        if bundle.refresh_token.value.is_empty() {
            return Err(TokenBundleError::EmptyValue("refresh token"));
        }
        Ok(bundle)
    }

    /// Serialize the bundle to cookie JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The bundle's scope.
    #[must_use]
    pub const fn role(&self) -> TokenRole {
        self.refresh_token.role
    }

    /// Whether the bundle belongs to a logged-in member.
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.role() == TokenRole::Member
    }

    /// Whether the access token is expired (or about to) at `now`.
    #[must_use]
    pub fn access_expired_at(&self, now: i64) -> bool {
        self.access_token.value.is_empty()
            || now >= self.access_token.expires_at.saturating_sub(EXPIRY_BUFFER_SECONDS)
    }
}

impl fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBundle")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.access_token.expires_at)
            .field("refresh_token", &"[REDACTED]")
            .field("role", &self.refresh_token.role)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn visitor_bundle() -> TokenBundle {
        TokenBundle::issued("access-1", "refresh-1", 14_400, TokenRole::Visitor, 1_000)
    }

    #[test]
    fn test_serializes_in_sdk_shape() {
        let json = visitor_bundle().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"accessToken":{"value":"access-1","expiresAt":15400},"refreshToken":{"value":"refresh-1","role":"visitor"}}"#
        );
    }

    #[test]
    fn test_parses_sdk_cookie() {
        let bundle = TokenBundle::from_json(
            r#"{"accessToken":{"value":"a","expiresAt":99},"refreshToken":{"value":"r","role":"member"}}"#,
        )
        .unwrap();
        assert!(bundle.is_member());
        assert_eq!(bundle.access_token.expires_at, 99);
    }

    #[test]
    fn test_rejects_null_and_garbage() {
        assert!(matches!(
            TokenBundle::from_json("null"),
            Err(TokenBundleError::Json(_))
        ));
        assert!(TokenBundle::from_json("{}").is_err());
        assert!(TokenBundle::from_json("not json").is_err());
    }

    #[test]
    fn test_rejects_empty_refresh_token() {
        let result = TokenBundle::from_json(
            r#"{"accessToken":{"value":"a","expiresAt":1},"refreshToken":{"value":"","role":"visitor"}}"#,
        );
        assert!(matches!(result, Err(TokenBundleError::EmptyValue(_))));
    }

    #[test]
    fn test_expiry_uses_buffer() {
        let bundle = visitor_bundle();
        assert!(!bundle.access_expired_at(15_000));
        assert!(bundle.access_expired_at(15_340));
        assert!(bundle.access_expired_at(20_000));
    }

    #[test]
    fn test_debug_redacts_values() {
        let debug = format!("{:?}", visitor_bundle());
        assert!(!debug.contains("access-1"));
        assert!(!debug.contains("refresh-1"));
        assert!(debug.contains("Visitor"));
    }
}
