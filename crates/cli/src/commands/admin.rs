//! Create admin accounts from the command line.
//!
//! # Usage
//!
//! ```bash
//! pmw-cli admin create -e admin@example.com -p <password> \
//!     --first-name Ada --last-name Lovelace
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)

use secrecy::SecretString;
use thiserror::Error;

use prestige_api::db::users::{NewUser, UserRepository};
use prestige_api::db::{self, RepositoryError};
use prestige_api::services::auth::{self, AuthError};
use prestige_core::{Email, UserRole};

/// Failures from the `admin` subcommands.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Rejected by the same rules the registration endpoint applies.
    #[error("Password error: {0}")]
    Password(#[from] AuthError),

    #[error("A user already exists with email: {0}")]
    UserExists(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Insert an admin account.
///
/// The password is validated and hashed with the same rules as the
/// public registration endpoint, so an admin created here can log in
/// through the normal `/auth/login` route.
///
/// # Errors
///
/// Returns `AdminError` if validation fails, the email is taken, or a
/// database operation fails.
pub async fn create_user(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    auth::validate_password(password)?;
    let password_hash = auth::hash_password(password)?;

    let database_url = std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| AdminError::MissingEnvVar("API_DATABASE_URL"))?;

    let pool = db::create_pool(&database_url).await?;

    let users = UserRepository::new(&pool);
    if users.find_by_email(&email).await?.is_some() {
        return Err(AdminError::UserExists(email.to_string()));
    }

    let user = users
        .create(&NewUser {
            first_name,
            last_name,
            email: &email,
            password_hash: &password_hash,
            phone_number: "",
            address: "",
            role: UserRole::Admin,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => other.into(),
        })?;

    tracing::info!(id = %user.id, email = %user.email, "admin account created");

    Ok(())
}
