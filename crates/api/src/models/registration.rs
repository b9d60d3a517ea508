//! Pending registration and password reset row types.
//!
//! Neither type is ever serialized into a response; PINs and hashes stay
//! server-side.

use chrono::{DateTime, Utc};

use prestige_core::{Email, PendingRegistrationId};

/// A sign-up waiting for its email PIN to be verified.
///
/// The password is hashed before the row is written; the plaintext is
/// dropped as soon as the registration request has been handled.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingRegistration {
    pub id: PendingRegistrationId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password_hash: String,
    pub phone_number: String,
    pub address: String,
    pub pin: String,
    pub pin_expires: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PendingRegistration {
    /// Whether `pin` matches and has not expired at `now`.
    ///
    /// Callers report a match failure and an expired PIN identically so
    /// the response does not reveal which check failed.
    #[must_use]
    pub fn accepts(&self, pin: &str, now: DateTime<Utc>) -> bool {
        self.pin == pin && self.pin_expires > now
    }
}

/// An active password-reset PIN, at most one per email.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordResetPin {
    pub email: Email,
    pub pin: String,
    pub pin_expires: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetPin {
    /// Whether `pin` matches and has not expired at `now`.
    #[must_use]
    pub fn accepts(&self, pin: &str, now: DateTime<Utc>) -> bool {
        self.pin == pin && self.pin_expires > now
    }
}
