//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (used for OAuth and
//!   checkout callbacks)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `STOREFRONT_CATALOG_SOURCE` - `collection` or `static` (default: collection)
//! - `STOREFRONT_INSTALLED_APPS_URL` - JSON endpoint listing installed example indexes
//! - `WIX_CLIENT_ID` - OAuth client ID (default: the demo site's client)
//! - `WIX_API_BASE_URL` - REST API base (default: <https://www.wixapis.com>)
//! - `WIX_EXAMPLES_COLLECTION` - Data collection holding the examples (default: examples)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Client ID of the demo headless site.
pub const DEFAULT_CLIENT_ID: &str = "10c1663b-2cdf-47c5-a3ef-30c2e8543849";

/// Production REST API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://www.wixapis.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront, without trailing slash
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Where the example catalog comes from
    pub catalog: CatalogConfig,
    /// Commerce API configuration
    pub wix: WixConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Commerce API configuration.
#[derive(Debug, Clone)]
pub struct WixConfig {
    /// OAuth client ID of the headless site
    pub client_id: String,
    /// REST API base URL, without trailing slash
    pub api_base_url: String,
}

/// Catalog page configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Where example entries are read from
    pub source: CatalogSource,
    /// Optional endpoint returning the installed example indexes
    pub installed_apps_url: Option<String>,
}

/// Source of the example entries on the catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Query a data collection sorted by `orderId`.
    Collection { collection_id: String },
    /// Read `examples.json` from the static directory.
    StaticAsset,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = validate_url("STOREFRONT_BASE_URL", &get_required_env("STOREFRONT_BASE_URL")?)?;
        let static_dir = PathBuf::from(get_env_or_default(
            "STOREFRONT_STATIC_DIR",
            "crates/storefront/static",
        ));

        let catalog = CatalogConfig::from_env()?;
        let wix = WixConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            static_dir,
            catalog,
            wix,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Absolute URL for a path on this storefront.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl WixConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: get_env_or_default("WIX_CLIENT_ID", DEFAULT_CLIENT_ID),
            api_base_url: validate_url(
                "WIX_API_BASE_URL",
                &get_env_or_default("WIX_API_BASE_URL", DEFAULT_API_BASE_URL),
            )?,
        })
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let collection_id = get_env_or_default("WIX_EXAMPLES_COLLECTION", "examples");
        let source = match get_env_or_default("STOREFRONT_CATALOG_SOURCE", "collection").as_str() {
            "collection" => CatalogSource::Collection { collection_id },
            "static" => CatalogSource::StaticAsset,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STOREFRONT_CATALOG_SOURCE".to_string(),
                    format!("expected 'collection' or 'static', got '{other}'"),
                ));
            }
        };

        let installed_apps_url = get_optional_env("STOREFRONT_INSTALLED_APPS_URL")
            .map(|url| validate_url("STOREFRONT_INSTALLED_APPS_URL", &url))
            .transpose()?;

        Ok(Self {
            source,
            installed_apps_url,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default literal.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Check that a value is an absolute http(s) URL and strip any trailing slash.
fn validate_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(value.trim_end_matches('/').to_string())
}
