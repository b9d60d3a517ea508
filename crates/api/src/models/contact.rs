//! Contact form message row type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use prestige_core::{ContactMessageId, Email};

/// A message submitted through the public contact form.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: Email,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
