//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `ROCKETSHOES_API_URL` - Base URL of the catalog API (default: `http://localhost:3333`)
//! - `ROCKETSHOES_API_TOKEN` - Bearer token for the catalog API
//! - `ROCKETSHOES_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `ROCKETSHOES_PRODUCT_CACHE_TTL_SECS` - Product metadata cache TTL, 0 disables (default: 300)
//! - `ROCKETSHOES_STORAGE_PATH` - File backing the key-value store (default: `.rocketshoes/storage.json`)
//! - `ROCKETSHOES_STORAGE_KEY` - Key the cart is stored under (default: `@RocketShoes:cart`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Key the cart is persisted under unless overridden.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_STORAGE_PATH: &str = ".rocketshoes/storage.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog and stock API configuration
    pub api: CatalogApiConfig,
    /// Persistent key-value store configuration
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Catalog API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CatalogApiConfig {
    /// Base URL; `stock/{id}` and `products/{id}` are resolved against it
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Product metadata cache TTL; `None` disables the cache
    pub product_cache_ttl: Option<Duration>,
}

impl std::fmt::Debug for CatalogApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("product_cache_ttl", &self.product_cache_ttl)
            .finish()
    }
}

/// Persistent key-value store configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// File backing the store
    pub path: PathBuf,
    /// Key holding the serialized cart
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORAGE_PATH),
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl CatalogApiConfig {
    /// Configuration for `base_url` with default timeout and cache TTL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            product_cache_ttl: Some(Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS)),
        }
    }

    fn from_source(source: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = get_or_default(source, "ROCKETSHOES_API_URL", DEFAULT_API_URL);
        let base_url = Url::parse(&with_trailing_slash(&raw_url)).map_err(|e| {
            ConfigError::InvalidEnvVar("ROCKETSHOES_API_URL".to_string(), e.to_string())
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_API_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let token = source("ROCKETSHOES_API_TOKEN")
            .map(|value| {
                validate_secret_strength(&value, "ROCKETSHOES_API_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(value))
            })
            .transpose()?;

        let timeout_secs = get_u64(
            source,
            "ROCKETSHOES_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let ttl_secs = get_u64(
            source,
            "ROCKETSHOES_PRODUCT_CACHE_TTL_SECS",
            DEFAULT_PRODUCT_CACHE_TTL_SECS,
        )?;

        Ok(Self {
            base_url,
            token,
            timeout: Duration::from_secs(timeout_secs),
            product_cache_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
        })
    }
}

impl StorageConfig {
    fn from_source(source: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let key = get_or_default(source, "ROCKETSHOES_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            path: PathBuf::from(get_or_default(
                source,
                "ROCKETSHOES_STORAGE_PATH",
                DEFAULT_STORAGE_PATH,
            )),
            key,
        })
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value or if
    /// the API token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Same as [`CartConfig::from_env`].
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_source(&|key| vars.get(key).cloned())
    }

    fn from_source(source: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api: CatalogApiConfig::from_source(source)?,
            storage: StorageConfig::from_source(source)?,
            sentry_dsn: source("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: source("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_or_default(source: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    source(key).unwrap_or_else(|| default.to_string())
}

fn get_u64(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    source(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
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

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = CartConfig::from_vars(&HashMap::new()).unwrap();

        assert_eq!(config.api.base_url.as_str(), "http://localhost:3333/");
        assert!(config.api.token.is_none());
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.api.product_cache_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.storage.key, "@RocketShoes:cart");
        assert_eq!(
            config.storage.path,
            PathBuf::from(".rocketshoes/storage.json")
        );
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = CartConfig::from_vars(&vars(&[
            ("ROCKETSHOES_API_URL", "https://api.example.org/v1"),
            ("ROCKETSHOES_HTTP_TIMEOUT_SECS", "3"),
            ("ROCKETSHOES_PRODUCT_CACHE_TTL_SECS", "0"),
            ("ROCKETSHOES_STORAGE_PATH", "/tmp/cart.json"),
            ("ROCKETSHOES_STORAGE_KEY", "@Other:cart"),
            ("SENTRY_DSN", "https://key@sentry.io/1"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url.as_str(), "https://api.example.org/v1/");
        assert_eq!(config.api.timeout, Duration::from_secs(3));
        assert!(config.api.product_cache_ttl.is_none());
        assert_eq!(config.storage.path, PathBuf::from("/tmp/cart.json"));
        assert_eq!(config.storage.key, "@Other:cart");
        assert_eq!(config.sentry_dsn.as_deref(), Some("https://key@sentry.io/1"));
    }

    #[test]
    fn test_invalid_values() {
        let bad_url = CartConfig::from_vars(&vars(&[("ROCKETSHOES_API_URL", "not a url")]));
        assert!(matches!(bad_url, Err(ConfigError::InvalidEnvVar(_, _))));

        let bad_scheme = CartConfig::from_vars(&vars(&[("ROCKETSHOES_API_URL", "ftp://host")]));
        assert!(matches!(bad_scheme, Err(ConfigError::InvalidEnvVar(_, _))));

        let bad_timeout =
            CartConfig::from_vars(&vars(&[("ROCKETSHOES_HTTP_TIMEOUT_SECS", "soon")]));
        assert!(matches!(bad_timeout, Err(ConfigError::InvalidEnvVar(_, _))));

        let zero_timeout = CartConfig::from_vars(&vars(&[("ROCKETSHOES_HTTP_TIMEOUT_SECS", "0")]));
        assert!(matches!(zero_timeout, Err(ConfigError::InvalidEnvVar(_, _))));

        let empty_key = CartConfig::from_vars(&vars(&[("ROCKETSHOES_STORAGE_KEY", "  ")]));
        assert!(matches!(empty_key, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let result = CartConfig::from_vars(&vars(&[("ROCKETSHOES_API_TOKEN", "your-token-here")]));
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));

        let low_entropy = CartConfig::from_vars(&vars(&[("ROCKETSHOES_API_TOKEN", "aaaaaaaaaaaa")]));
        assert!(matches!(low_entropy, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let config = CartConfig::from_vars(&vars(&[(
            "ROCKETSHOES_API_TOKEN",
            "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6",
        )]))
        .unwrap();

        let debug_output = format!("{:?}", config.api);
        assert!(debug_output.contains("localhost:3333"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("aB3$xY9"));
    }
}
