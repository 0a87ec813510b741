//! OAuth token endpoint calls and member login (PKCE) helpers.
//!
//! # Login Flow
//!
//! 1. Generate [`OAuthData`] with [`OAuthData::generate`] and keep it in a cookie
//! 2. Ask the service for a hosted-login URL with
//!    [`WixSession::auth_url`](super::WixSession::auth_url)
//! 3. The service redirects back with `code` and `state`
//! 4. Exchange the code with [`WixClient::exchange_code`] for member tokens

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, RngCore, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use headless_demo_core::{RefreshToken, TokenBundle, TokenRole};

use super::client::{WixClient, read_json};
use super::types::{TokenRequest, TokenResponse};
use super::WixError;

const TOKEN_PATH: &str = "/oauth2/token";

/// PKCE state carried from login start to the login callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthData {
    pub state: String,
    pub code_verifier: String,
    pub code_challenge: String,
    pub redirect_uri: String,
    /// Page to return to once the member is logged in.
    pub original_uri: String,
}

impl OAuthData {
    /// Generate fresh state and a PKCE verifier/challenge pair.
    #[must_use]
    pub fn generate(redirect_uri: &str, original_uri: &str) -> Self {
        let mut verifier_bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut verifier_bytes);
        let code_verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        Self {
            state: random_string(32),
            code_challenge: code_challenge(&code_verifier),
            code_verifier,
            redirect_uri: redirect_uri.to_string(),
            original_uri: original_uri.to_string(),
        }
    }

    /// Validate a callback against this login attempt and return its code.
    ///
    /// # Errors
    ///
    /// Returns `WixError::OAuth` if the service reported an error, the state
    /// does not match, or no code was provided.
    pub fn authorization_code<'a>(&self, callback: &'a OAuthCallback) -> Result<&'a str, WixError> {
        if let Some(error) = &callback.error {
            let description = callback.error_description.as_deref().unwrap_or_default();
            return Err(WixError::OAuth(format!("{error}: {description}")));
        }

        if callback.state.as_deref() != Some(self.state.as_str()) {
            return Err(WixError::OAuth("state mismatch".to_string()));
        }

        callback
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| WixError::OAuth("missing authorization code".to_string()))
    }
}

/// Query parameters of the login callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// S256 PKCE challenge for a verifier.
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Random alphanumeric string.
fn random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

impl WixClient {
    /// Mint anonymous visitor tokens for this client ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint is unreachable or refuses.
    #[instrument(skip(self))]
    pub async fn generate_visitor_tokens(&self) -> Result<TokenBundle, WixError> {
        self.request_tokens(&TokenRequest::anonymous(self.client_id()), TokenRole::Visitor)
            .await
    }

    /// Exchange a refresh token for a new bundle with the same role.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh is rejected.
    #[instrument(skip_all, fields(role = ?refresh_token.role))]
    pub async fn refresh_tokens(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<TokenBundle, WixError> {
        let request = TokenRequest {
            grant_type: "refresh_token",
            refresh_token: Some(refresh_token.value.as_str()),
            ..TokenRequest::anonymous(self.client_id())
        };
        self.request_tokens(&request, refresh_token.role).await
    }

    /// Exchange an authorization code for member tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the code or verifier is rejected.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        data: &OAuthData,
    ) -> Result<TokenBundle, WixError> {
        let request = TokenRequest {
            grant_type: "authorization_code",
            code: Some(code),
            code_verifier: Some(data.code_verifier.as_str()),
            redirect_uri: Some(data.redirect_uri.as_str()),
            ..TokenRequest::anonymous(self.client_id())
        };
        self.request_tokens(&request, TokenRole::Member).await
    }

    async fn request_tokens(
        &self,
        request: &TokenRequest<'_>,
        role: TokenRole,
    ) -> Result<TokenBundle, WixError> {
        let response = self
            .http()
            .post(self.endpoint(TOKEN_PATH))
            .json(request)
            .send()
            .await?;

        let tokens: TokenResponse = read_json(response).await.map_err(|e| match e {
            WixError::Api { status, message } => {
                WixError::OAuth(format!("{} grant failed ({status}): {message}", request.grant_type))
            }
            other => other,
        })?;

        tracing::debug!(grant_type = request.grant_type, "tokens issued");

        Ok(TokenBundle::issued(
            tokens.access_token,
            tokens.refresh_token,
            tokens.expires_in,
            role,
            chrono::Utc::now().timestamp(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_code_challenge_rfc7636_vector() {
        // Appendix B of RFC 7636
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_generate_oauth_data() {
        let data = OAuthData::generate("http://localhost:3000/login-callback", "http://localhost:3000/store");
        assert_eq!(data.state.len(), 32);
        assert_eq!(data.code_verifier.len(), 43);
        assert!(!data.code_challenge.contains('='));
        assert_eq!(data.code_challenge, code_challenge(&data.code_verifier));

        let other = OAuthData::generate("a", "b");
        assert_ne!(data.state, other.state);
    }

    #[test]
    fn test_authorization_code_checks_state() {
        let data = OAuthData::generate("r", "o");
        let callback = OAuthCallback {
            code: Some("code-1".to_string()),
            state: Some(data.state.clone()),
            ..Default::default()
        };
        assert_eq!(data.authorization_code(&callback).unwrap(), "code-1");

        let forged = OAuthCallback {
            state: Some("forged".to_string()),
            ..callback
        };
        assert!(matches!(
            data.authorization_code(&forged),
            Err(WixError::OAuth(_))
        ));
    }

    #[test]
    fn test_authorization_code_surfaces_provider_error() {
        let data = OAuthData::generate("r", "o");
        let callback = OAuthCallback {
            error: Some("access_denied".to_string()),
            error_description: Some("user cancelled".to_string()),
            state: Some(data.state.clone()),
            ..Default::default()
        };
        let err = data.authorization_code(&callback).unwrap_err();
        assert_eq!(err.to_string(), "OAuth error: access_denied: user cancelled");
    }
}
