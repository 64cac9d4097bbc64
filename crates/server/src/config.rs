//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RATING_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `RATING_JWT_SECRET` - Bearer token signing key (min 32 chars, high entropy)
//!
//! ## Optional
//! - `RATING_HOST` - Bind address (default: 127.0.0.1)
//! - `RATING_PORT` - Listen port (default: 3001)
//! - `RATING_CORS_ORIGIN` - Allowed browser origin for the single-page client
//! - `RATING_AUTH_RATE_LIMIT` - Rate limit `/api/auth/*` (default: true)
//! - `LOG_FORMAT` - `json` for JSON log lines, anything else for human-readable
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Shortest accepted signing key, in bytes. HS256 keys shorter than the
/// hash output weaken the MAC.
const MIN_SIGNING_KEY_LENGTH: usize = 32;

/// Lowest accepted Shannon entropy of the signing key.
const MIN_SIGNING_KEY_ENTROPY: f64 = 3.3;

/// Substrings that mark a copied-from-docs signing key (matched lowercase).
const PLACEHOLDER_MARKERS: &[&str] = &[
    "changeme",
    "change-me",
    "placeholder",
    "example",
    "secret",
    "your-",
    "replace",
    "todo",
    "xxx",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
    #[error("Insecure signing key in {0}: {1}")]
    InsecureSecret(&'static str, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// HMAC key for bearer tokens
    pub jwt_secret: SecretString,
    /// Browser origin allowed by CORS; `None` disables the CORS layer
    pub cors_origin: Option<String>,
    /// Whether `/api/auth/*` is rate limited
    pub auth_rate_limit: bool,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing key fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env
            .optional("RATING_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or(ConfigError::MissingEnvVar("RATING_DATABASE_URL"))?;

        let jwt_secret = env
            .optional("RATING_JWT_SECRET")
            .ok_or(ConfigError::MissingEnvVar("RATING_JWT_SECRET"))?;
        check_signing_key(&jwt_secret).map_err(|reason| {
            ConfigError::InsecureSecret("RATING_JWT_SECRET", reason)
        })?;

        Ok(Self {
            database_url,
            host: env.parsed("RATING_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: env.parsed("RATING_PORT", 3001)?,
            jwt_secret: SecretString::from(jwt_secret),
            cors_origin: env.optional("RATING_CORS_ORIGIN"),
            auth_rate_limit: env.flag("RATING_AUTH_RATE_LIMIT", true)?,
            json_logs: env
                .optional("LOG_FORMAT")
                .is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parsed("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.parsed("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Typed access to variables through a lookup function.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Value of `key`; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// `key` parsed as `T`, or `default` when unset.
    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key, e.to_string()))
        })
    }

    /// Boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`/`on`/`off`).
    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key,
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }
}

/// Reject short, placeholder, or low-entropy signing keys.
fn check_signing_key(key: &str) -> Result<(), String> {
    if key.len() < MIN_SIGNING_KEY_LENGTH {
        return Err(format!(
            "must be at least {MIN_SIGNING_KEY_LENGTH} characters (got {})",
            key.len()
        ));
    }

    let lower = key.to_lowercase();
    if let Some(marker) = PLACEHOLDER_MARKERS.iter().find(|m| lower.contains(*m)) {
        return Err(format!("looks like a placeholder (contains '{marker}')"));
    }

    let entropy = shannon_entropy(key);
    if entropy < MIN_SIGNING_KEY_ENTROPY {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_SIGNING_KEY_ENTROPY:.1}); \
             generate it with `openssl rand -base64 48`"
        ));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
#[allow(clippy::cast_precision_loss)]
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total = counts.values().sum::<usize>() as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    const KEY: &str = "q7Lk2Vx9Rt4Mz8Pw1Ny6Bc3Hd5Fg0Js2W";

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("RATING_DATABASE_URL", "postgres://localhost/ratings"),
            ("RATING_JWT_SECRET", KEY),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = load(&minimal()).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert!(config.auth_rate_limit);
        assert!(!config.json_logs);
        assert_eq!(config.cors_origin, None);
        assert_eq!(config.sentry_sample_rate, 1.0);
        assert_eq!(config.sentry_traces_sample_rate, 0.1);
    }

    #[test]
    fn test_overrides() {
        let mut vars = minimal();
        vars.extend([
            ("RATING_HOST", "0.0.0.0"),
            ("RATING_PORT", "8080"),
            ("RATING_CORS_ORIGIN", "http://localhost:3000"),
            ("RATING_AUTH_RATE_LIMIT", "off"),
            ("LOG_FORMAT", "JSON"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:3000"));
        assert!(!config.auth_rate_limit);
        assert!(config.json_logs);
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[
            ("DATABASE_URL", "postgres://fallback/ratings"),
            ("RATING_JWT_SECRET", KEY),
        ])
        .unwrap();
        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://fallback/ratings"
        );
    }

    #[test]
    fn test_missing_required() {
        assert!(matches!(
            load(&[("RATING_JWT_SECRET", KEY)]),
            Err(ConfigError::MissingEnvVar("RATING_DATABASE_URL"))
        ));
        assert!(matches!(
            load(&[("RATING_DATABASE_URL", "postgres://localhost/ratings")]),
            Err(ConfigError::MissingEnvVar("RATING_JWT_SECRET"))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = minimal();
        vars.push(("RATING_PORT", "seventy"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar("RATING_PORT", _))
        ));

        let mut vars = minimal();
        vars.push(("RATING_AUTH_RATE_LIMIT", "maybe"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar("RATING_AUTH_RATE_LIMIT", _))
        ));
    }

    #[test]
    fn test_signing_key_checks() {
        assert!(check_signing_key("short").is_err());
        assert!(check_signing_key("your-jwt-key-goes-here-0123456789").is_err());
        assert!(check_signing_key(&"ab".repeat(16)).is_err());
        assert!(check_signing_key(KEY).is_ok());
    }

    #[test]
    fn test_signing_key_length_boundary() {
        let exact = &KEY[..MIN_SIGNING_KEY_LENGTH];
        assert!(check_signing_key(exact).is_ok());

        let short = &KEY[..MIN_SIGNING_KEY_LENGTH - 1];
        assert!(
            check_signing_key(short)
                .unwrap_err()
                .contains("at least 32 characters")
        );
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(KEY) > MIN_SIGNING_KEY_ENTROPY);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[
            ("RATING_DATABASE_URL", "postgres://user:hunter2@db/ratings"),
            ("RATING_JWT_SECRET", KEY),
        ])
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains(KEY));
    }
}
