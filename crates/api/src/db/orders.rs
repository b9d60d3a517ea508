//! Order repository and the Postgres order store.
//!
//! [`OrderRepository`] serves reads and admin status updates.
//! [`PgOrderStore`] backs the confirmation flow: it persists a verified
//! draft and decrements vehicle stock in one transaction, so a sold-out
//! model rolls the whole order back.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use prestige_core::{OrderId, OrderStatus, UserId, VehicleId};

use super::{DiscountRepository, RepositoryError, VehicleRepository};
use crate::models::{Discount, Order, OrderItem, OrderResponse, Vehicle};
use crate::services::orders::{Buyer, OrderFlowError, OrderStore, PendingConfirmation};

const ORDER_COLUMNS: &str = "id, user_id, user_name, user_email, total_amount, \
     discount_code, discount_percentage, discount_description, discounted_total, \
     status, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, vehicle_id, model_name, color, \
     modifications, price";

/// The discount snapshot columns are written together or not at all.
fn check_discount_integrity(order: &Order) -> Result<(), RepositoryError> {
    if order.discount_code.is_some() == order.discount_percentage.is_some() {
        Ok(())
    } else {
        Err(RepositoryError::DataCorruption(format!(
            "order {} has a partial discount snapshot",
            order.id
        )))
    }
}

/// Query handle for order reads and admin status updates.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all orders with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when a query fails, or
    /// `RepositoryError::DataCorruption` for a partial discount snapshot.
    pub async fn list_all(&self) -> Result<Vec<OrderResponse>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    /// List a user's orders with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when a query fails, or
    /// `RepositoryError::DataCorruption` for a partial discount snapshot.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderResponse>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    /// Get one order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when a query fails, or
    /// `RepositoryError::DataCorruption` for a partial discount snapshot.
    pub async fn find_by_id(&self, id: OrderId) -> Result<Option<OrderResponse>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match order {
            Some(order) => Ok(Some(self.with_items(order).await?)),
            None => Ok(None),
        }
    }

    /// Set an order's status.
    ///
    /// Transition rules are enforced by the caller, which already holds
    /// the current status.
    ///
    /// Returns the updated order, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when a query fails, or
    /// `RepositoryError::DataCorruption` for a partial discount snapshot.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<OrderResponse>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        match order {
            Some(order) => Ok(Some(self.with_items(order).await?)),
            None => Ok(None),
        }
    }

    async fn with_items(&self, order: Order) -> Result<OrderResponse, RepositoryError> {
        check_discount_integrity(&order)?;

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order.id)
        .fetch_all(self.pool)
        .await?;

        Ok(OrderResponse::from_parts(order, items))
    }

    async fn attach_items(&self, orders: Vec<Order>) -> Result<Vec<OrderResponse>, RepositoryError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = orders.iter().map(|order| order.id.as_i32()).collect();
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        orders
            .into_iter()
            .map(|order| {
                check_discount_integrity(&order)?;
                let items = by_order.remove(&order.id).unwrap_or_default();
                Ok(OrderResponse::from_parts(order, items))
            })
            .collect()
    }
}

/// Postgres-backed store for the order confirmation flow.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn active_discount(&self, code: &str) -> Result<Option<Discount>, OrderFlowError> {
        let discount = DiscountRepository::new(&self.pool)
            .find_active_by_code(code)
            .await?;

        Ok(discount)
    }

    async fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, OrderFlowError> {
        let vehicle = VehicleRepository::new(&self.pool).find_by_id(id).await?;

        Ok(vehicle)
    }

    async fn persist_confirmed(
        &self,
        buyer: &Buyer,
        confirmation: &PendingConfirmation,
    ) -> Result<OrderResponse, OrderFlowError> {
        let (code, percentage, description) = match &confirmation.discount {
            Some(discount) => (
                Some(discount.code.as_str()),
                Some(discount.percentage),
                Some(discount.description.as_str()),
            ),
            None => (None, None, None),
        };

        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders \
                 (user_id, user_name, user_email, total_amount, discount_code, \
                  discount_percentage, discount_description, discounted_total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(buyer.id)
        .bind(&buyer.full_name)
        .bind(&buyer.email)
        .bind(confirmation.total)
        .bind(code)
        .bind(percentage)
        .bind(description)
        .bind(confirmation.discounted_total)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(confirmation.items.len());
        for draft in &confirmation.items {
            // Each car consumes one unit; the guard makes the decrement
            // atomic so two confirmations can't oversell the last one.
            let remaining = sqlx::query_scalar::<_, i32>(
                "UPDATE vehicles SET stock = stock - 1, updated_at = NOW() \
                 WHERE id = $1 AND stock >= 1 \
                 RETURNING stock",
            )
            .bind(draft.vehicle_id)
            .fetch_optional(&mut *tx)
            .await?;

            if remaining.is_none() {
                // Transaction drops here, rolling back the order row and
                // any decrements already applied.
                let name = sqlx::query_scalar::<_, String>("SELECT name FROM vehicles WHERE id = $1")
                    .bind(draft.vehicle_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                return Err(match name {
                    Some(model) => OrderFlowError::OutOfStock { model },
                    None => OrderFlowError::ModelNotFound,
                });
            }

            let item = sqlx::query_as::<_, OrderItem>(&format!(
                "INSERT INTO order_items \
                     (order_id, vehicle_id, model_name, color, modifications, price) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING {ITEM_COLUMNS}"
            ))
            .bind(order.id)
            .bind(draft.vehicle_id)
            .bind(&draft.model_name)
            .bind(&draft.color)
            .bind(&draft.modifications)
            .bind(draft.price)
            .fetch_one(&mut *tx)
            .await?;

            items.push(item);
        }

        tx.commit().await?;

        Ok(OrderResponse::from_parts(order, items))
    }
}
