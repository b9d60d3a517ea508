//! Order rows, line items, and response shapes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use prestige_core::{Email, OrderId, OrderItemId, OrderStatus, UserId, VehicleId};

/// A confirmed order as stored in the `orders` table.
///
/// The buyer's name and email are snapshotted at confirmation time so the
/// order survives later profile edits or account deletion. The discount
/// columns are likewise a snapshot of the code as it was when applied;
/// they are written together or not at all.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: Email,
    pub total_amount: Decimal,
    pub discount_code: Option<String>,
    pub discount_percentage: Option<i16>,
    pub discount_description: Option<String>,
    pub discounted_total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single configured car on an order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub vehicle_id: VehicleId,
    pub model_name: String,
    pub color: String,
    /// Selected options keyed by option name (JSONB object).
    pub modifications: serde_json::Value,
    pub price: Decimal,
}

/// The discount applied to an order, frozen at application time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSnapshot {
    pub code: String,
    pub percentage: i16,
    pub description: String,
}

/// Order as returned by the order endpoints, with items inlined.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub items: Vec<OrderItemResponse>,
    pub total_amount: Decimal,
    pub discount: Option<DiscountSnapshot>,
    pub discounted_total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line item as embedded in [`OrderResponse`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub model_id: VehicleId,
    pub model_name: String,
    pub color: String,
    pub modifications: serde_json::Value,
    pub price: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            model_id: item.vehicle_id,
            model_name: item.model_name,
            color: item.color,
            modifications: item.modifications,
            price: item.price,
        }
    }
}

impl OrderResponse {
    /// Assemble a response from an order row and its line items.
    ///
    /// Expects the repository to have verified that the discount columns
    /// are either all present or all absent.
    #[must_use]
    pub fn from_parts(order: Order, items: Vec<OrderItem>) -> Self {
        let discount = match (order.discount_code, order.discount_percentage) {
            (Some(code), Some(percentage)) => Some(DiscountSnapshot {
                code,
                percentage,
                description: order.discount_description.unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            id: order.id,
            user_id: order.user_id,
            user_name: order.user_name,
            user_email: order.user_email.into_inner(),
            items: items.into_iter().map(OrderItemResponse::from).collect(),
            total_amount: order.total_amount,
            discount,
            discounted_total: order.discounted_total,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_order(discount: bool) -> Order {
        Order {
            id: OrderId::new(11),
            user_id: UserId::new(4),
            user_name: "Ava Marsh".to_owned(),
            user_email: Email::parse("ava@example.com").unwrap(),
            total_amount: Decimal::from(120_000),
            discount_code: discount.then(|| "THANKYOU".to_owned()),
            discount_percentage: discount.then_some(2),
            discount_description: discount.then(|| "Thank you discount".to_owned()),
            discounted_total: Decimal::from(if discount { 117_600 } else { 120_000 }),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_item() -> OrderItem {
        OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(11),
            vehicle_id: VehicleId::new(3),
            model_name: "GT Coupe".to_owned(),
            color: "Racing Green".to_owned(),
            modifications: serde_json::json!({"wheels": "Forged alloy"}),
            price: Decimal::from(120_000),
        }
    }

    #[test]
    fn test_response_inlines_discount_snapshot() {
        let response = OrderResponse::from_parts(sample_order(true), vec![sample_item()]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["discount"]["code"], "THANKYOU");
        assert_eq!(json["discount"]["percentage"], 2);
        assert_eq!(json["discountedTotal"], "117600");
        assert_eq!(json["items"][0]["modelId"], 3);
        assert_eq!(json["items"][0]["modelName"], "GT Coupe");
    }

    #[test]
    fn test_response_without_discount_serializes_null() {
        let response = OrderResponse::from_parts(sample_order(false), vec![]);
        let json = serde_json::to_value(&response).unwrap();

        assert!(json["discount"].is_null());
        assert_eq!(json["status"], "Pending");
    }
}
