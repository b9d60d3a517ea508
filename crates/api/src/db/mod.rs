//! Database operations for the `prestige` `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Customer accounts (argon2 password hashes, JSONB cart)
//! - `pending_registrations` - Unverified sign-ups awaiting a PIN
//! - `password_reset_pins` - Active password-reset PINs (one per email)
//! - `vehicles` - The vehicle catalog (soft-deleted via `is_active`)
//! - `orders` / `order_items` - Confirmed orders with line items
//! - `discounts` - Percentage discount codes
//! - `appointments` - Service and test-drive bookings
//! - `customizations` - Catalog of optional extras
//! - `contact_messages` - Public contact form submissions
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p prestige-cli -- migrate
//! ```

pub mod appointments;
pub mod contact_messages;
pub mod customizations;
pub mod discounts;
pub mod orders;
pub mod registrations;
pub mod users;
pub mod vehicles;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use appointments::AppointmentRepository;
pub use contact_messages::ContactMessageRepository;
pub use customizations::CustomizationRepository;
pub use discounts::DiscountRepository;
pub use orders::{OrderRepository, PgOrderStore};
pub use registrations::RegistrationRepository;
pub use users::UserRepository;
pub use vehicles::VehicleRepository;

/// Errors surfaced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Query or connection failure from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value failed to parse back into its domain type.
    #[error("stored data invalid: {0}")]
    DataCorruption(String),

    /// No row matched the lookup.
    #[error("not found")]
    NotFound,

    /// A unique constraint rejected the write (e.g. duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
///
/// All other errors pass through as `RepositoryError::Database`.
pub(crate) fn unique_conflict(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}

/// Open the shared connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if `PostgreSQL` cannot be reached or the URL
/// is malformed.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
