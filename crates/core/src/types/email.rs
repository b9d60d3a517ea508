//! Validated email address newtype.
//!
//! Every address in the system (accounts, pending registrations, order
//! snapshots, contact messages) goes through [`Email::parse`] exactly once,
//! at the edge; everything downstream can rely on the shape.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string was rejected by [`Email::parse`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum EmailError {
    /// Nothing left after trimming whitespace.
    #[error("email address is empty")]
    Empty,
    /// Longer than the RFC 5321 limit.
    #[error("email address exceeds {} characters", Email::MAX_LENGTH)]
    TooLong,
    /// No @ separator anywhere in the input.
    #[error("email address is missing an @ symbol")]
    MissingAtSymbol,
    /// Nothing before the @.
    #[error("email address has no local part before the @")]
    EmptyLocalPart,
    /// Nothing after the @.
    #[error("email address has no domain after the @")]
    EmptyDomain,
}

/// A syntactically plausible email address.
///
/// Parsing trims surrounding whitespace and checks structure only: at most
/// 254 characters, one @ with something on both sides. Real deliverability
/// is proven by the PIN emails, not by the type.
///
/// ```
/// use prestige_core::Email;
///
/// assert!(Email::parse("driver@example.com").is_ok());
/// assert!(Email::parse("  driver@example.com\n").is_ok());
///
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("@example.com").is_err());
/// assert!(Email::parse("driver@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
pub struct Email(String);

impl Email {
    /// Maximum accepted length (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and validate an address, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] naming the first structural problem found.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the owned address string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
