//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `MARKETPLACE_HOST` - Bind address (default: 127.0.0.1)
//! - `MARKETPLACE_PORT` - Listen port (default: 3000)
//! - `MARKETPLACE_BASE_URL` - Public URL, used for verification links and to
//!   decide whether cookies are `Secure` (default: <http://localhost:3000>)
//! - `MARKETPLACE_DATA_DIR` - Directory holding the JSON collections
//!   (default: mockdb)
//! - `MARKETPLACE_PRODUCT_COUNT` - Generated catalog size (default: 50)
//! - `MARKETPLACE_SESSION_TTL_HOURS` - Session lifetime (default: 168)
//! - `MARKETPLACE_{LOGIN,SIGNUP,VERIFY}_MAX_ATTEMPTS` - Attempts per window
//!   (defaults: 5, 3, 10)
//! - `MARKETPLACE_{LOGIN,SIGNUP,VERIFY}_WINDOW_SECS` - Window length
//!   (defaults: 900, 3600, 3600)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::TimeDelta;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::catalog::mock::DEFAULT_PRODUCT_COUNT;
use crate::db::sessions::DEFAULT_SESSION_TTL_HOURS;
use crate::services::rate_limit::{RateLimitConfig, RateLimitPolicies};

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_DATA_DIR: &str = "mockdb";
const DEFAULT_PORT: u16 = 3000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
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
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Directory holding the JSON collections
    pub data_dir: PathBuf,
    /// Number of generated catalog products
    pub product_count: usize,
    /// Lifetime of a login session
    pub session_ttl: TimeDelta,
    /// Attempt budgets for auth actions
    pub rate_limits: RateLimitPolicies,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            product_count: DEFAULT_PRODUCT_COUNT,
            session_ttl: TimeDelta::hours(DEFAULT_SESSION_TTL_HOURS),
            rate_limits: RateLimitPolicies::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env = Env(&lookup);

        let base_url = env.parsed("MARKETPLACE_BASE_URL", defaults.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "MARKETPLACE_BASE_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let session_ttl_hours: i64 =
            env.parsed("MARKETPLACE_SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "MARKETPLACE_SESSION_TTL_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }

        let rate_limits = RateLimitPolicies {
            login: env.rate_limit("LOGIN", defaults.rate_limits.login)?,
            signup: env.rate_limit("SIGNUP", defaults.rate_limits.signup)?,
            verify: env.rate_limit("VERIFY", defaults.rate_limits.verify)?,
        };

        Ok(Self {
            host: env.parsed("MARKETPLACE_HOST", defaults.host)?,
            port: env.parsed("MARKETPLACE_PORT", defaults.port)?,
            base_url,
            data_dir: env.get("MARKETPLACE_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            product_count: env.parsed("MARKETPLACE_PRODUCT_COUNT", defaults.product_count)?,
            session_ttl: TimeDelta::hours(session_ttl_hours),
            rate_limits,
            sentry_dsn: env.get("SENTRY_DSN").map(SecretString::from),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Link a new user follows to verify their email address.
    #[must_use]
    pub fn verification_url(&self, token: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/verify-email?token={token}")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with parsing helpers.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a variable, treating blank values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
            None => Ok(default),
        }
    }

    /// Read `MARKETPLACE_<ACTION>_MAX_ATTEMPTS` and `..._WINDOW_SECS`.
    fn rate_limit(
        &self,
        action: &str,
        default: RateLimitConfig,
    ) -> Result<RateLimitConfig, ConfigError> {
        let attempts_key = format!("MARKETPLACE_{action}_MAX_ATTEMPTS");
        let window_key = format!("MARKETPLACE_{action}_WINDOW_SECS");

        let max_attempts: u32 = self.parsed(&attempts_key, default.max_attempts)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                attempts_key,
                "must be at least 1".to_string(),
            ));
        }

        let window_secs: u32 =
            self.parsed(&window_key, u32::try_from(default.window.num_seconds()).unwrap_or(u32::MAX))?;
        if window_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                window_key,
                "must be at least 1".to_string(),
            ));
        }

        Ok(RateLimitConfig::new(
            max_attempts,
            TimeDelta::seconds(i64::from(window_secs)),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.base_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.data_dir, PathBuf::from("mockdb"));
        assert_eq!(config.product_count, 50);
        assert_eq!(config.session_ttl, TimeDelta::days(7));
        assert_eq!(config.rate_limits, RateLimitPolicies::default());
        assert!(config.sentry_dsn.is_none());
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("MARKETPLACE_HOST", "0.0.0.0"),
            ("MARKETPLACE_PORT", "8080"),
            ("MARKETPLACE_BASE_URL", "https://shop.example.com"),
            ("MARKETPLACE_DATA_DIR", "/var/lib/marketplace"),
            ("MARKETPLACE_SESSION_TTL_HOURS", "2"),
            ("MARKETPLACE_LOGIN_MAX_ATTEMPTS", "7"),
            ("MARKETPLACE_LOGIN_WINDOW_SECS", "60"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(config.secure_cookies());
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/marketplace"));
        assert_eq!(config.session_ttl, TimeDelta::hours(2));
        assert_eq!(
            config.rate_limits.login,
            RateLimitConfig::new(7, TimeDelta::minutes(1))
        );
        assert_eq!(config.rate_limits.signup, RateLimitConfig::signup());
        assert_eq!(
            config.sentry_dsn.unwrap().expose_secret(),
            "https://key@sentry.example.com/1"
        );
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[("MARKETPLACE_PORT", "  ")]).unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = load(&[("MARKETPLACE_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("MARKETPLACE_PORT"));

        let err = load(&[("MARKETPLACE_BASE_URL", "not a url")]).unwrap_err();
        assert!(err.to_string().contains("MARKETPLACE_BASE_URL"));

        let err = load(&[("MARKETPLACE_SIGNUP_MAX_ATTEMPTS", "0")]).unwrap_err();
        assert!(err.to_string().contains("MARKETPLACE_SIGNUP_MAX_ATTEMPTS"));

        let err = load(&[("MARKETPLACE_SESSION_TTL_HOURS", "-1")]).unwrap_err();
        assert!(err.to_string().contains("MARKETPLACE_SESSION_TTL_HOURS"));
    }

    #[test]
    fn test_verification_url() {
        let config = load(&[("MARKETPLACE_BASE_URL", "https://shop.example.com/")]).unwrap();
        assert_eq!(
            config.verification_url("abc"),
            "https://shop.example.com/verify-email?token=abc"
        );
    }

    #[test]
    fn test_debug_redacts_sentry_dsn() {
        let config = load(&[("SENTRY_DSN", "https://supersecretkey@sentry.example.com/1")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("supersecretkey"));
    }
}
