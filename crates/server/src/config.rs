//! Server configuration loaded from environment variables.
//!
//! Required: `DATABASE_URL`, `JWT_SECRET`, `JWT_REFRESH_SECRET` (signing
//! secrets must be at least 32 characters of real entropy).
//!
//! Optional: `HOST` (default 127.0.0.1), `PORT` (default 3001), `UPLOAD_DIR`
//! (default `uploads`), `COOKIE_SECURE` (default false), `SENTRY_DSN`,
//! `SENTRY_ENVIRONMENT`.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Substrings that mark a signing secret as a copy-pasted placeholder.
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

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Access-token signing secret.
    pub jwt_secret: SecretString,
    /// Refresh-token signing secret, distinct from the access secret.
    pub jwt_refresh_secret: SecretString,
    /// Root directory for uploaded assets.
    pub upload_dir: PathBuf,
    /// Whether auth cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl ServerConfig {
    /// Load configuration from the environment, reading `.env` first if one
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or malformed,
    /// or if a signing secret looks like a placeholder or is too weak.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: required("DATABASE_URL").map(SecretString::from)?,
            host: parsed_or("HOST", "127.0.0.1")?,
            port: parsed_or("PORT", "3001")?,
            jwt_secret: signing_secret("JWT_SECRET")?,
            jwt_refresh_secret: signing_secret("JWT_REFRESH_SECRET")?,
            upload_dir: PathBuf::from(or_default("UPLOAD_DIR", "uploads")),
            cookie_secure: parsed_or("COOKIE_SECURE", "false")?,
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            sentry_environment: std::env::var("SENTRY_ENVIRONMENT").ok(),
        })
    }

    /// The socket address the server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

fn or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parsed_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Load a signing secret, rejecting placeholders, short values, and
/// low-entropy strings.
fn signing_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    validate_signing_secret(key, &value)?;
    Ok(SecretString::from(value))
}

fn validate_signing_secret(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            key.to_owned(),
            format!(
                "must be at least {MIN_SECRET_LENGTH} characters (got {})",
                value.len()
            ),
        ));
    }

    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                key.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            key.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // secrets are far below f64 precision limits
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_repeated_char_is_zero() {
        assert!(shannon_entropy("aaaaaaa").abs() < f64::EPSILON);
        assert!(shannon_entropy("").abs() < f64::EPSILON);
    }

    #[test]
    fn entropy_of_even_two_char_split_is_one_bit() {
        assert!((shannon_entropy("abab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn random_looking_secret_clears_the_bar() {
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6") > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn placeholder_secrets_are_rejected() {
        let err = validate_signing_secret("JWT_SECRET", "your-jwt-key-here-your-jwt-key-here")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn short_secrets_are_rejected() {
        let err = validate_signing_secret("JWT_SECRET", "too-short").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn low_entropy_secrets_are_rejected() {
        let err = validate_signing_secret("JWT_SECRET", &"a".repeat(40)).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn strong_secrets_are_accepted() {
        assert!(validate_signing_secret("JWT_SECRET", "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q").is_ok());
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/shopmate"),
            host: "0.0.0.0".parse().unwrap(),
            port: 3001,
            jwt_secret: SecretString::from("x".repeat(32)),
            jwt_refresh_secret: SecretString::from("y".repeat(32)),
            upload_dir: PathBuf::from("uploads"),
            cookie_secure: false,
            sentry_dsn: None,
            sentry_environment: None,
        };

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3001");
    }
}
