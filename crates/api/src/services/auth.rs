//! Authentication primitives: password hashing, credential checks, and
//! JWT issue/verify.
//!
//! Route handlers orchestrate these against the repositories; nothing in
//! here touches the database.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use prestige_core::UserId;

use crate::db::RepositoryError;

/// Shortest password the account rules accept.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// How long an issued login token stays valid.
const TOKEN_TTL_HOURS: i64 = 24;

/// Failures from credential and token handling.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] prestige_core::EmailError),

    /// Wrong password or no such account. One message covers both so a
    /// login probe can't tell which emails exist.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("user already exists")]
    UserAlreadyExists,

    /// The payload is safe to show the client.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Bearer token missing, malformed, expired, or signed with another key.
    #[error("invalid token")]
    InvalidToken,

    #[error("token creation failed")]
    TokenCreation,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing error")]
    PasswordHash,
}

/// Claims carried in a login token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's ID.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Check a candidate password against the account rules.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` with a user-facing message if the
/// password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    Ok(())
}

/// Argon2id-hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Check a password against a stored Argon2 hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password doesn't match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Issue a signed login token for a user, valid for 24 hours.
///
/// # Errors
///
/// Returns `AuthError::TokenCreation` if signing fails.
pub fn issue_token(user_id: UserId, secret: &SecretString) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Failed to sign login token: {e}");
        AuthError::TokenCreation
    })
}

/// Verify a login token and extract the user ID it was issued for.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` if the token is malformed, expired,
/// or signed with a different secret.
pub fn verify_token(token: &str, secret: &SecretString) -> Result<UserId, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::InvalidToken)?;

    let id: i32 = data.claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

    Ok(UserId::new(id))
}
