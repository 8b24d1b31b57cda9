//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `CHECKOUT_BASE_URL` - Public URL of the storefront
//!
//! ## Optional
//! - `CHECKOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHECKOUT_PORT` - Listen port (default: 3000)
//! - `CHECKOUT_RATE_LIMIT` - Rate limit the customer API by proxy client IP (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//!
//! ## PayTR (payments are disabled when `PAYTR_MERCHANT_ID` is unset)
//! - `PAYTR_MERCHANT_ID`, `PAYTR_MERCHANT_KEY`, `PAYTR_MERCHANT_SALT`
//! - `PAYTR_API_BASE` (default: <https://www.paytr.com>)
//! - `PAYTR_OK_URL`, `PAYTR_FAIL_URL` (default: derived from the base URL)
//! - `PAYTR_TEST_MODE`, `PAYTR_NO_INSTALLMENT`, `PAYTR_DEBUG` (default: false)
//! - `PAYTR_CURRENCY` (default: TL)
//! - `PAYTR_MAX_INSTALLMENT` (default: 0)
//! - `PAYTR_TIMEOUT_LIMIT` - minutes the hosted page stays valid (default: 30)
//! - `PAYTR_LANG` (default: tr)
//! - `PAYTR_REQUEST_TIMEOUT_SECS` - token request timeout (default: 20)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Checkout service configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the storefront
    pub base_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Whether to rate limit the customer API by proxy client IP
    pub rate_limit: bool,
    /// Payment gateway settings; `None` disables payments
    pub paytr: Option<PaytrConfig>,
}

/// PayTR merchant configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct PaytrConfig {
    pub merchant_id: String,
    pub merchant_key: SecretString,
    pub merchant_salt: SecretString,
    /// Scheme and host of the PayTR API, without trailing slash
    pub api_base: String,
    pub ok_url: String,
    pub fail_url: String,
    pub test_mode: bool,
    pub currency: String,
    pub max_installment: u8,
    pub no_installment: bool,
    /// Minutes the hosted payment page stays valid
    pub timeout_limit: u32,
    pub lang: String,
    pub debug: bool,
    /// Timeout for the outbound token request
    pub request_timeout: Duration,
}

impl std::fmt::Debug for PaytrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaytrConfig")
            .field("merchant_id", &self.merchant_id)
            .field("merchant_key", &"[REDACTED]")
            .field("merchant_salt", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("ok_url", &self.ok_url)
            .field("fail_url", &self.fail_url)
            .field("test_mode", &self.test_mode)
            .field("currency", &self.currency)
            .field("max_installment", &self.max_installment)
            .field("no_installment", &self.no_installment)
            .field("timeout_limit", &self.timeout_limit)
            .field("lang", &self.lang)
            .field("debug", &self.debug)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if merchant secrets fail validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CHECKOUT_DATABASE_URL")?;
        let host = get_env_or_default("CHECKOUT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_HOST".to_string(), e.to_string()))?;
        let port = parse_env("CHECKOUT_PORT", 3000_u16)?;
        let base_url = get_required_env("CHECKOUT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();

        let paytr = PaytrConfig::from_env(&base_url)?;
        if paytr.is_none() {
            tracing::warn!("PAYTR_MERCHANT_ID not set; payments are disabled");
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            rate_limit: parse_bool_env("CHECKOUT_RATE_LIMIT", true)?,
            paytr,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaytrConfig {
    /// Load PayTR settings, or `None` when no merchant id is configured.
    fn from_env(base_url: &str) -> Result<Option<Self>, ConfigError> {
        let Some(merchant_id) = get_optional_env("PAYTR_MERCHANT_ID").filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };

        let api_base = get_env_or_default("PAYTR_API_BASE", "https://www.paytr.com");
        Url::parse(&api_base)
            .map_err(|e| ConfigError::InvalidEnvVar("PAYTR_API_BASE".to_string(), e.to_string()))?;

        Ok(Some(Self {
            merchant_id,
            merchant_key: get_validated_secret("PAYTR_MERCHANT_KEY")?,
            merchant_salt: get_validated_secret("PAYTR_MERCHANT_SALT")?,
            api_base: api_base.trim_end_matches('/').to_string(),
            ok_url: get_optional_env("PAYTR_OK_URL")
                .unwrap_or_else(|| format!("{base_url}/checkout/success")),
            fail_url: get_optional_env("PAYTR_FAIL_URL")
                .unwrap_or_else(|| format!("{base_url}/checkout/failed")),
            test_mode: parse_bool_env("PAYTR_TEST_MODE", false)?,
            currency: get_env_or_default("PAYTR_CURRENCY", "TL"),
            max_installment: parse_env("PAYTR_MAX_INSTALLMENT", 0_u8)?,
            no_installment: parse_bool_env("PAYTR_NO_INSTALLMENT", false)?,
            timeout_limit: parse_env("PAYTR_TIMEOUT_LIMIT", 30_u32)?,
            lang: get_env_or_default("PAYTR_LANG", "tr"),
            debug: parse_bool_env("PAYTR_DEBUG", false)?,
            request_timeout: Duration::from_secs(parse_env("PAYTR_REQUEST_TIMEOUT_SECS", 20_u64)?),
        }))
    }

    /// URL of the token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/odeme/api/get-token", self.api_base)
    }

    /// URL of the hosted payment page for a token.
    #[must_use]
    pub fn checkout_url(&self, token: &str) -> String {
        format!("{}/odeme/guvenli/{token}", self.api_base)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Parse an optional boolean flag (`1/0`, `true/false`, `yes/no`).
fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| parse_bool(&raw, key))
}

fn parse_bool(raw: &str, key: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the value from the merchant panel."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
