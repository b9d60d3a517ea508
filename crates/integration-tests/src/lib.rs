//! Integration tests for Prestige Motor Works.
//!
//! # Running
//!
//! ```bash
//! cargo test -p prestige-integration-tests
//! ```
//!
//! These tests drive the library crates directly; no running server,
//! database, or SMTP relay is required. The harness below swaps the
//! purchase flow's persistence and email seams for in-memory stand-ins:
//!
//! - [`MemoryOrderStore`] holds vehicles, discounts, and confirmed
//!   orders behind mutexes, and performs the same guarded stock
//!   decrement the SQL store does.
//! - [`RecordingNotifier`] captures outbound email instead of sending.
//!
//! # Suites
//!
//! - `order_confirmation` - The two-step PIN purchase flow
//! - `order_status` - Status transition rules and serialized forms
//! - `api_responses` - JSON shapes of the public response types

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::types::Json;

use prestige_api::models::{Discount, Order, OrderItem, OrderResponse, Specifications, Vehicle};
use prestige_api::services::email::{EmailError, Notifier, OutboundEmail};
use prestige_api::services::orders::{
    Buyer, DraftItem, OrderFlowError, OrderStore, PendingConfirmation,
};
use prestige_core::{DiscountId, Email, OrderId, OrderItemId, OrderStatus, UserId, VehicleId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory [`OrderStore`] with the same decrement guard as the SQL
/// store: a confirmation either takes one unit per item or fails whole.
#[derive(Default)]
pub struct MemoryOrderStore {
    vehicles: Mutex<HashMap<VehicleId, Vehicle>>,
    discounts: Mutex<Vec<Discount>>,
    persisted: Mutex<Vec<OrderResponse>>,
    next_order_id: AtomicI32,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new(vehicles: Vec<Vehicle>) -> Self {
        Self {
            vehicles: Mutex::new(vehicles.into_iter().map(|v| (v.id, v)).collect()),
            ..Self::default()
        }
    }

    /// Add an active discount code; stored uppercase like the database.
    #[must_use]
    pub fn with_discount(self, code: &str, percentage: i16, description: &str) -> Self {
        {
            let mut discounts = lock(&self.discounts);
            let id = DiscountId::new(i32::try_from(discounts.len()).unwrap_or(0) + 1);
            discounts.push(Discount {
                id,
                code: code.trim().to_uppercase(),
                percentage,
                description: description.to_owned(),
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }
        self
    }

    pub fn set_stock(&self, id: VehicleId, stock: i32) {
        if let Some(vehicle) = lock(&self.vehicles).get_mut(&id) {
            vehicle.stock = stock;
        }
    }

    #[must_use]
    pub fn stock_of(&self, id: VehicleId) -> i32 {
        lock(&self.vehicles).get(&id).map_or(0, |v| v.stock)
    }

    /// All confirmed orders, oldest first.
    #[must_use]
    pub fn orders(&self) -> Vec<OrderResponse> {
        lock(&self.persisted).clone()
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.persisted).len()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn active_discount(&self, code: &str) -> Result<Option<Discount>, OrderFlowError> {
        let normalized = code.trim().to_uppercase();
        Ok(lock(&self.discounts)
            .iter()
            .find(|d| d.code == normalized && d.is_active)
            .cloned())
    }

    async fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, OrderFlowError> {
        Ok(lock(&self.vehicles).get(&id).cloned())
    }

    async fn persist_confirmed(
        &self,
        buyer: &Buyer,
        confirmation: &PendingConfirmation,
    ) -> Result<OrderResponse, OrderFlowError> {
        let mut vehicles = lock(&self.vehicles);
        // One unit per item, or nothing at all.
        let before = vehicles.clone();
        for item in &confirmation.items {
            let Some(vehicle) = vehicles.get_mut(&item.vehicle_id) else {
                *vehicles = before;
                return Err(OrderFlowError::ModelNotFound);
            };
            if vehicle.stock < 1 {
                let model = vehicle.name.clone();
                *vehicles = before;
                return Err(OrderFlowError::OutOfStock { model });
            }
            vehicle.stock -= 1;
        }

        let order_id = OrderId::new(self.next_order_id.fetch_add(1, Ordering::SeqCst) + 1);
        let order = Order {
            id: order_id,
            user_id: buyer.id,
            user_name: buyer.full_name.clone(),
            user_email: buyer.email.clone(),
            total_amount: confirmation.total,
            discount_code: confirmation.discount.as_ref().map(|d| d.code.clone()),
            discount_percentage: confirmation.discount.as_ref().map(|d| d.percentage),
            discount_description: confirmation
                .discount
                .as_ref()
                .map(|d| d.description.clone()),
            discounted_total: confirmation.discounted_total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut next_item = 1_i32;
        let mut items = Vec::with_capacity(confirmation.items.len());
        for item in &confirmation.items {
            items.push(OrderItem {
                id: OrderItemId::new(next_item),
                order_id,
                vehicle_id: item.vehicle_id,
                model_name: item.model_name.clone(),
                color: item.color.clone(),
                modifications: item.modifications.clone(),
                price: item.price,
            });
            next_item += 1;
        }

        let response = OrderResponse::from_parts(order, items);
        lock(&self.persisted).push(response.clone());
        Ok(response)
    }
}

/// Captures outbound email; can be flipped into a failing state to
/// exercise send-error paths.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundEmail> {
        lock(&self.sent).clone()
    }

    #[must_use]
    pub fn sent_count(&self) -> usize {
        lock(&self.sent).len()
    }

    /// Poll until `count` messages have been sent, for emails dispatched
    /// from background tasks. Gives up after a second.
    pub async fn wait_for(&self, count: usize) {
        for _ in 0..200 {
            if self.sent_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: OutboundEmail) -> Result<(), EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::InvalidAddress("forced failure".to_owned()));
        }
        lock(&self.sent).push(email);
        Ok(())
    }
}

/// A buyer with the given account ID and email address.
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
pub fn buyer(id: i32, first_name: &str, last_name: &str, email: &str) -> Buyer {
    Buyer {
        id: UserId::new(id),
        first_name: first_name.to_owned(),
        full_name: format!("{first_name} {last_name}"),
        email: Email::parse(email).expect("valid test email"),
    }
}

/// An in-stock, active vehicle for the store.
#[must_use]
pub fn vehicle(id: i32, name: &str, stock: i32) -> Vehicle {
    Vehicle {
        id: VehicleId::new(id),
        name: name.to_owned(),
        year: 2026,
        base_price: Decimal::from(100_000),
        image_url: String::new(),
        description: String::new(),
        features: Vec::new(),
        specifications: Json(Specifications::default()),
        stock,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A draft line item with no selected modifications.
#[must_use]
pub fn draft(vehicle_id: i32, price: i64) -> DraftItem {
    DraftItem {
        vehicle_id: VehicleId::new(vehicle_id),
        color: "Slate Grey".to_owned(),
        modifications: serde_json::json!({}),
        price: Decimal::from(price),
    }
}
