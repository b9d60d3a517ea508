//! Customization catalog row type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use prestige_core::CustomizationId;

/// An optional extra that can be configured onto compatible vehicles.
///
/// `compatible_models` holds raw vehicle ids; an empty list means the
/// customization fits every vehicle.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    pub id: CustomizationId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub compatible_models: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
