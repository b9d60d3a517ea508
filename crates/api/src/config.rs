//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `JWT_SECRET` - Bearer-token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 3000)
//! - `SMTP_HOST` - SMTP relay host; when unset the notifier runs in dev mode
//!   and logs outbound mail instead of sending
//! - `SMTP_PORT` - SMTP relay port (default: 587)
//! - `SMTP_USERNAME` - SMTP login
//! - `SMTP_PASSWORD` - SMTP password
//! - `EMAIL_FROM` - From address (default: `Prestige Motor Works <no-reply@prestigemotorworks.example>`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Fragments that mark a secret as a leftover template value. Matched
/// case-insensitively anywhere in the string.
const PLACEHOLDER_FRAGMENTS: &[&str] = &[
    "changeme",
    "change-me",
    "your-",
    "my-",
    "example",
    "placeholder",
    "secret",
    "password",
    "dummy",
    "sample",
    "insert",
    "replace",
    "todo",
    "xxx",
];

/// Why configuration loading failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("{var} is not valid: {reason}")]
    InvalidEnvVar { var: &'static str, reason: String },
    #[error("{var} rejected: {reason}")]
    WeakSecret { var: &'static str, reason: String },
}

/// Runtime configuration for the API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Postgres connection string, password included
    pub database_url: SecretString,
    /// Bind address
    pub host: IpAddr,
    /// Bind port
    pub port: u16,
    /// Bearer-token signing secret
    pub jwt_secret: SecretString,
    /// SMTP relay configuration; `None` selects the logging dev-mode notifier
    pub smtp: Option<SmtpConfig>,
    /// Sentry DSN; error reporting is off without one
    pub sentry_dsn: Option<String>,
}

/// SMTP relay configuration.
///
/// `Debug` is written by hand so the password never reaches a log line.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP relay host
    pub host: String,
    /// SMTP relay port
    pub port: u16,
    /// SMTP login
    pub username: String,
    /// SMTP password
    pub password: SecretString,
    /// From address for all outbound mail
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from the environment, reading `.env` first if
    /// one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is absent, a value
    /// fails to parse, or `JWT_SECRET` looks too weak to sign tokens with.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: database_url()?,
            host: parsed_env("API_HOST", "127.0.0.1")?,
            port: parsed_env("API_PORT", "3000")?,
            jwt_secret: strong_secret("JWT_SECRET")?,
            smtp: SmtpConfig::from_env()?,
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
        })
    }

    /// Socket address the server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SmtpConfig {
    /// SMTP is optional: absent `SMTP_HOST` means dev mode. When the host is
    /// set, the username and password become required.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Ok(host) = std::env::var("SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            host,
            port: parsed_env("SMTP_PORT", "587")?,
            username: require_env("SMTP_USERNAME")?,
            password: require_env("SMTP_PASSWORD").map(SecretString::from)?,
            from_address: std::env::var("EMAIL_FROM").unwrap_or_else(|_| {
                "Prestige Motor Works <no-reply@prestigemotorworks.example>".to_owned()
            }),
        }))
    }
}

// =============================================================================
// Env parsing helpers
// =============================================================================

fn require_env(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingEnvVar(var))
}

/// Read `var` (or fall back to `default`) and parse it.
fn parsed_env<T>(var: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(var)
        .unwrap_or_else(|_| default.to_owned())
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar {
            var,
            reason: e.to_string(),
        })
}

/// `API_DATABASE_URL`, falling back to the plain `DATABASE_URL` that
/// `fly postgres attach` sets.
fn database_url() -> Result<SecretString, ConfigError> {
    std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar("API_DATABASE_URL"))
}

/// Read a signing secret and refuse values unfit for production.
fn strong_secret(var: &'static str) -> Result<SecretString, ConfigError> {
    let value = require_env(var)?;
    check_secret(&value, var)?;
    Ok(SecretString::from(value))
}

/// Reject short, template, and low-entropy secrets.
fn check_secret(value: &str, var: &'static str) -> Result<(), ConfigError> {
    let weak = |reason: String| ConfigError::WeakSecret { var, reason };

    if value.len() < MIN_SECRET_LENGTH {
        return Err(weak(format!(
            "shorter than {MIN_SECRET_LENGTH} characters"
        )));
    }

    let lower = value.to_lowercase();
    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().find(|f| lower.contains(**f)) {
        return Err(weak(format!(
            "contains the placeholder fragment '{fragment}'"
        )));
    }

    let entropy = entropy_bits_per_char(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(weak(format!(
            "entropy {entropy:.2} bits/char is below the {MIN_ENTROPY_BITS_PER_CHAR:.1} floor; generate a random value"
        )));
    }

    Ok(())
}

/// Shannon entropy of the character distribution, in bits per character.
fn entropy_bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, f64> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1.0;
    }

    let total: f64 = counts.values().sum();
    if total == 0.0 {
        return 0.0;
    }

    counts
        .values()
        .map(|count| {
            let p = count / total;
            -(p * p.log2())
        })
        .sum()
}
