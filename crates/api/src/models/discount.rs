//! Discount code row type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use prestige_core::DiscountId;

/// A percentage discount code.
///
/// Codes are stored uppercase; lookups normalize their input the same
/// way. The active flag switches a code off without deleting it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: DiscountId,
    pub code: String,
    pub percentage: i16,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_serializes_camel_case() {
        let discount = Discount {
            id: DiscountId::new(1),
            code: "THANKYOU".to_owned(),
            percentage: 2,
            description: "Thank you discount".to_owned(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&discount).unwrap();
        assert_eq!(json["code"], "THANKYOU");
        assert_eq!(json["isActive"], true);
        assert!(json.get("is_active").is_none());
    }
}
