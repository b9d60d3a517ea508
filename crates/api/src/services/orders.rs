//! The PIN-confirmed purchase flow.
//!
//! Buying is a two-step exchange: `request_confirmation` validates a draft
//! order, parks it in an in-process TTL cache under a fresh six-digit PIN,
//! and emails the PIN; `confirm` checks a submitted PIN against the cache
//! and only then persists the order and decrements stock.
//!
//! The cache is keyed by user, holds at most one draft per user (a new
//! request replaces the old entry in a single atomic swap), and evicts
//! entries after the PIN validity window. It is process-local: a restart
//! drops pending confirmations, which is acceptable for a single-instance
//! deployment.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use prestige_core::{Email, UserId, VehicleId, money};

use crate::db::RepositoryError;
use crate::models::{Discount, DiscountSnapshot, OrderResponse, User, Vehicle};
use crate::services::email::{
    self, EmailError, Notifier, OrderSummary, OrderSummaryDiscount, OrderSummaryItem,
};
use crate::services::pins;

/// Upper bound on simultaneously pending confirmations.
const PENDING_CAPACITY: u64 = 10_000;

/// Errors that can occur in the purchase flow.
#[derive(Debug, Error)]
pub enum OrderFlowError {
    /// Draft had no line items.
    #[error("order draft has no items")]
    EmptyOrder,

    /// A line item failed validation.
    #[error("invalid line item: {0}")]
    InvalidItem(String),

    /// A referenced vehicle doesn't exist or is no longer sold.
    #[error("model not found")]
    ModelNotFound,

    /// The conditional stock decrement found the model sold out.
    #[error("{model} is out of stock")]
    OutOfStock { model: String },

    /// Attached discount code is absent or inactive.
    #[error("unknown or inactive discount code")]
    UnknownDiscount,

    /// No pending confirmation exists for this user.
    #[error("no pending order")]
    NoPendingOrder,

    /// Submitted PIN is wrong or expired; the two are not distinguished.
    #[error("invalid or expired PIN")]
    InvalidPin,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// PIN email could not be built or handed to the notifier.
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// The purchasing user, snapshotted into the order.
#[derive(Debug, Clone)]
pub struct Buyer {
    pub id: UserId,
    pub first_name: String,
    pub full_name: String,
    pub email: Email,
}

impl From<&User> for Buyer {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            full_name: user.full_name(),
            email: user.email.clone(),
        }
    }
}

/// A line item as submitted by the client.
///
/// The model name is looked up server-side; whatever the client calls the
/// car is ignored.
#[derive(Debug, Clone)]
pub struct DraftItem {
    pub vehicle_id: VehicleId,
    pub color: String,
    pub modifications: Value,
    pub price: Decimal,
}

/// A validated line item held in the pending cache.
#[derive(Debug, Clone)]
pub struct PendingItem {
    pub vehicle_id: VehicleId,
    pub model_name: String,
    pub color: String,
    pub modifications: Value,
    pub price: Decimal,
}

/// A draft order parked under a PIN, waiting for confirmation.
#[derive(Debug)]
pub struct PendingConfirmation {
    pub items: Vec<PendingItem>,
    pub discount: Option<DiscountSnapshot>,
    pub total: Decimal,
    pub discounted_total: Decimal,
    pub pin: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingConfirmation {
    /// Whether a submitted PIN is accepted at `now`.
    ///
    /// A mismatch and an expired PIN are deliberately indistinguishable to
    /// the caller.
    #[must_use]
    pub fn accepts(&self, pin: &str, now: DateTime<Utc>) -> bool {
        self.pin == pin && now < self.expires_at
    }
}

/// Persistence seam for the purchase flow.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Resolve an active discount by code (trimmed, case-insensitive).
    async fn active_discount(&self, code: &str) -> Result<Option<Discount>, OrderFlowError>;

    /// Look up a vehicle by ID, active or not.
    async fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, OrderFlowError>;

    /// Persist a confirmed draft: order row, line items, and one
    /// conditional stock decrement per item, all in one transaction.
    async fn persist_confirmed(
        &self,
        buyer: &Buyer,
        confirmation: &PendingConfirmation,
    ) -> Result<OrderResponse, OrderFlowError>;
}

/// Drives the two-step purchase: request a PIN, then confirm with it.
#[derive(Clone)]
pub struct OrderFlow {
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn Notifier>,
    pending: Cache<UserId, Arc<PendingConfirmation>>,
    pin_source: fn() -> String,
}

impl OrderFlow {
    /// Create a new flow over the given store and notifier.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, notifier: Arc<dyn Notifier>) -> Self {
        #[allow(clippy::cast_sign_loss)] // PIN_TTL_MINUTES is a positive constant
        let pending = Cache::builder()
            .max_capacity(PENDING_CAPACITY)
            .time_to_live(Duration::from_secs(pins::PIN_TTL_MINUTES as u64 * 60))
            .build();

        Self {
            store,
            notifier,
            pending,
            pin_source: pins::generate_pin,
        }
    }

    /// Replace the PIN source, for tests that need a known code.
    #[must_use]
    pub fn with_pin_source(mut self, pin_source: fn() -> String) -> Self {
        self.pin_source = pin_source;
        self
    }

    /// Validate a draft, park it under a fresh PIN, and email the PIN.
    ///
    /// Replaces any prior pending confirmation for this user. The PIN never
    /// appears in the API response, only in the email.
    ///
    /// # Errors
    ///
    /// Returns `EmptyOrder`/`InvalidItem` for a bad draft, `ModelNotFound`
    /// if a referenced vehicle is missing or retired, `UnknownDiscount` if
    /// the attached code doesn't resolve, and `Email` if the PIN can't be
    /// sent. The entry is cached before the send, so after a send failure
    /// re-requesting acts as a resend.
    pub async fn request_confirmation(
        &self,
        buyer: &Buyer,
        items: Vec<DraftItem>,
        discount_code: Option<&str>,
    ) -> Result<(), OrderFlowError> {
        if items.is_empty() {
            return Err(OrderFlowError::EmptyOrder);
        }

        let mut pending_items = Vec::with_capacity(items.len());
        for item in items {
            if item.price <= Decimal::ZERO {
                return Err(OrderFlowError::InvalidItem(
                    "each car must have a positive price".to_owned(),
                ));
            }

            let vehicle = self
                .store
                .vehicle(item.vehicle_id)
                .await?
                .filter(|vehicle| vehicle.is_active)
                .ok_or(OrderFlowError::ModelNotFound)?;

            pending_items.push(PendingItem {
                vehicle_id: item.vehicle_id,
                model_name: vehicle.name,
                color: item.color,
                modifications: item.modifications,
                price: item.price,
            });
        }

        let discount = match discount_code {
            Some(code) => {
                let discount = self
                    .store
                    .active_discount(code)
                    .await?
                    .ok_or(OrderFlowError::UnknownDiscount)?;

                Some(DiscountSnapshot {
                    code: discount.code,
                    percentage: discount.percentage,
                    description: discount.description,
                })
            }
            None => None,
        };

        let (total, discounted_total) = totals(&pending_items, discount.as_ref());

        let pin = (self.pin_source)();
        let confirmation = Arc::new(PendingConfirmation {
            items: pending_items,
            discount,
            total,
            discounted_total,
            pin: pin.clone(),
            expires_at: pins::expiry_from(Utc::now()),
        });

        // Cache first: if the send fails the entry survives, and the
        // client can re-request to get a fresh PIN.
        self.pending
            .insert(buyer.id, Arc::clone(&confirmation))
            .await;

        let summary = summary_of(&confirmation);
        let message = email::order_pin_email(&buyer.email, &buyer.first_name, &pin, &summary)?;
        self.notifier.send(message).await?;

        Ok(())
    }

    /// Verify a submitted PIN and persist the pending order.
    ///
    /// On success the cache entry is consumed and a receipt email goes out
    /// in the background; its failure is logged, never surfaced. On a
    /// wrong PIN or a sold-out model the entry stays put, so the user can
    /// try again until it expires.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingOrder` if nothing is pending for this user,
    /// `InvalidPin` for a wrong or expired PIN, and `OutOfStock`/
    /// `ModelNotFound` when persisting fails.
    pub async fn confirm(
        &self,
        buyer: &Buyer,
        submitted_pin: &str,
    ) -> Result<OrderResponse, OrderFlowError> {
        let confirmation = self
            .pending
            .get(&buyer.id)
            .await
            .ok_or(OrderFlowError::NoPendingOrder)?;

        if !confirmation.accepts(submitted_pin, Utc::now()) {
            return Err(OrderFlowError::InvalidPin);
        }

        let order = self.store.persist_confirmed(buyer, &confirmation).await?;

        self.pending.invalidate(&buyer.id).await;

        let summary = summary_of(&confirmation);
        match email::order_receipt_email(&buyer.email, &buyer.first_name, &summary) {
            Ok(message) => {
                let notifier = Arc::clone(&self.notifier);
                tokio::spawn(async move {
                    if let Err(e) = notifier.send(message).await {
                        tracing::warn!("Failed to send order receipt: {e}");
                    }
                });
            }
            Err(e) => tracing::warn!("Failed to render order receipt: {e}"),
        }

        Ok(order)
    }
}

/// Sum the line items and apply the discount snapshot, if any.
fn totals(items: &[PendingItem], discount: Option<&DiscountSnapshot>) -> (Decimal, Decimal) {
    let total: Decimal = items.iter().map(|item| item.price).sum();
    let discounted =
        discount.map_or(total, |snapshot| money::discounted_total(total, snapshot.percentage));

    (total, discounted)
}

fn summary_of(confirmation: &PendingConfirmation) -> OrderSummary {
    OrderSummary {
        items: confirmation
            .items
            .iter()
            .map(|item| OrderSummaryItem {
                model_name: item.model_name.clone(),
                color: item.color.clone(),
                modifications: join_modifications(&item.modifications),
                price: item.price,
            })
            .collect(),
        cart_total: confirmation.total,
        discount: confirmation
            .discount
            .as_ref()
            .map(|snapshot| OrderSummaryDiscount {
                percentage: snapshot.percentage,
                description: snapshot.description.clone(),
            }),
        discounted_total: confirmation.discounted_total,
    }
}

/// Join the selected option values for display in the order emails.
fn join_modifications(modifications: &Value) -> String {
    match modifications.as_object() {
        Some(map) if !map.is_empty() => map
            .values()
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => "None".to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Duration as ChronoDuration;
    use sqlx::types::Json;

    use prestige_core::{DiscountId, OrderId, OrderItemId};

    use super::*;
    use crate::models::{Order, OrderItem, Specifications};
    use crate::services::email::OutboundEmail;

    fn buyer(id: i32) -> Buyer {
        Buyer {
            id: UserId::new(id),
            first_name: "Ava".to_owned(),
            full_name: "Ava Marsh".to_owned(),
            email: Email::parse("ava@example.com").unwrap(),
        }
    }

    fn draft_item(vehicle_id: i32, price: i64) -> DraftItem {
        DraftItem {
            vehicle_id: VehicleId::new(vehicle_id),
            color: "Racing Green".to_owned(),
            modifications: serde_json::json!({"wheels": "Forged alloy"}),
            price: Decimal::from(price),
        }
    }

    fn vehicle(id: i32, name: &str, stock: i32, is_active: bool) -> Vehicle {
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
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct MockStore {
        vehicles: Mutex<HashMap<VehicleId, Vehicle>>,
        discounts: Vec<Discount>,
        persisted: Mutex<Vec<OrderResponse>>,
    }

    impl MockStore {
        fn new(vehicles: Vec<Vehicle>) -> Self {
            Self {
                vehicles: Mutex::new(
                    vehicles.into_iter().map(|v| (v.id, v)).collect(),
                ),
                discounts: Vec::new(),
                persisted: Mutex::new(Vec::new()),
            }
        }

        fn with_discount(mut self, code: &str, percentage: i16, description: &str) -> Self {
            self.discounts.push(Discount {
                id: DiscountId::new(1),
                code: code.to_owned(),
                percentage,
                description: description.to_owned(),
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
            self
        }

        fn stock_of(&self, id: i32) -> i32 {
            self.vehicles.lock().unwrap()[&VehicleId::new(id)].stock
        }

        fn persisted_count(&self) -> usize {
            self.persisted.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl OrderStore for MockStore {
        async fn active_discount(&self, code: &str) -> Result<Option<Discount>, OrderFlowError> {
            let normalized = code.trim().to_uppercase();
            Ok(self
                .discounts
                .iter()
                .find(|d| d.code == normalized && d.is_active)
                .cloned())
        }

        async fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, OrderFlowError> {
            Ok(self.vehicles.lock().unwrap().get(&id).cloned())
        }

        async fn persist_confirmed(
            &self,
            buyer: &Buyer,
            confirmation: &PendingConfirmation,
        ) -> Result<OrderResponse, OrderFlowError> {
            let mut vehicles = self.vehicles.lock().unwrap();
            // Decrement like the SQL does, restoring everything on failure.
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

            let order = Order {
                id: OrderId::new(1),
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
                status: prestige_core::OrderStatus::Pending,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            let items = confirmation
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| OrderItem {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    id: OrderItemId::new(i as i32 + 1),
                    order_id: order.id,
                    vehicle_id: item.vehicle_id,
                    model_name: item.model_name.clone(),
                    color: item.color.clone(),
                    modifications: item.modifications.clone(),
                    price: item.price,
                })
                .collect();

            let response = OrderResponse::from_parts(order, items);
            self.persisted.lock().unwrap().push(response.clone());
            Ok(response)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<OutboundEmail>>,
        fail: std::sync::atomic::AtomicBool,
    }

    impl RecordingNotifier {
        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        fn last_text(&self) -> String {
            self.sent.lock().unwrap().last().unwrap().text.clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, email: OutboundEmail) -> Result<(), EmailError> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(EmailError::InvalidAddress("forced failure".to_owned()));
            }
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    fn flow_with(
        store: Arc<MockStore>,
        notifier: Arc<RecordingNotifier>,
    ) -> OrderFlow {
        OrderFlow::new(store, notifier).with_pin_source(|| "123456".to_owned())
    }

    async fn wait_for_sends(notifier: &RecordingNotifier, count: usize) {
        for _ in 0..100 {
            if notifier.sent_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_request_then_confirm_persists_and_decrements() {
        let store = Arc::new(MockStore::new(vec![vehicle(3, "GT Coupe", 2, true)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(Arc::clone(&store), Arc::clone(&notifier));
        let buyer = buyer(1);

        flow.request_confirmation(&buyer, vec![draft_item(3, 120_000)], None)
            .await
            .unwrap();

        assert_eq!(notifier.sent_count(), 1);
        assert_eq!(notifier.last_text().trim(), "Your confirmation PIN is: 123456");

        let order = flow.confirm(&buyer, "123456").await.unwrap();
        assert_eq!(order.discounted_total, Decimal::from(120_000));
        assert_eq!(order.items[0].model_name, "GT Coupe");
        assert_eq!(store.stock_of(3), 1);

        // Receipt is sent in the background after confirmation.
        wait_for_sends(&notifier, 2).await;
        assert_eq!(notifier.sent_count(), 2);
        assert!(notifier.last_text().contains("Your order has been confirmed!"));
    }

    #[tokio::test]
    async fn test_confirm_consumes_the_entry() {
        let store = Arc::new(MockStore::new(vec![vehicle(3, "GT Coupe", 5, true)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(store, Arc::clone(&notifier));
        let buyer = buyer(1);

        flow.request_confirmation(&buyer, vec![draft_item(3, 120_000)], None)
            .await
            .unwrap();
        flow.confirm(&buyer, "123456").await.unwrap();

        assert!(matches!(
            flow.confirm(&buyer, "123456").await,
            Err(OrderFlowError::NoPendingOrder)
        ));
    }

    #[tokio::test]
    async fn test_wrong_pin_keeps_the_entry() {
        let store = Arc::new(MockStore::new(vec![vehicle(3, "GT Coupe", 5, true)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(Arc::clone(&store), notifier);
        let buyer = buyer(1);

        flow.request_confirmation(&buyer, vec![draft_item(3, 120_000)], None)
            .await
            .unwrap();

        assert!(matches!(
            flow.confirm(&buyer, "000000").await,
            Err(OrderFlowError::InvalidPin)
        ));
        assert_eq!(store.persisted_count(), 0);

        // The right PIN still works afterwards.
        flow.confirm(&buyer, "123456").await.unwrap();
        assert_eq!(store.persisted_count(), 1);
    }

    #[tokio::test]
    async fn test_confirm_without_request_fails() {
        let store = Arc::new(MockStore::new(vec![]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(store, notifier);

        assert!(matches!(
            flow.confirm(&buyer(9), "123456").await,
            Err(OrderFlowError::NoPendingOrder)
        ));
    }

    #[tokio::test]
    async fn test_rejects_empty_and_invalid_drafts() {
        let store = Arc::new(MockStore::new(vec![vehicle(3, "GT Coupe", 5, true)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(store, notifier);
        let buyer = buyer(1);

        assert!(matches!(
            flow.request_confirmation(&buyer, vec![], None).await,
            Err(OrderFlowError::EmptyOrder)
        ));
        assert!(matches!(
            flow.request_confirmation(&buyer, vec![draft_item(3, 0)], None)
                .await,
            Err(OrderFlowError::InvalidItem(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_unknown_vehicle_and_retired_vehicle() {
        let store = Arc::new(MockStore::new(vec![vehicle(4, "Retired", 5, false)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(store, notifier);
        let buyer = buyer(1);

        assert!(matches!(
            flow.request_confirmation(&buyer, vec![draft_item(99, 1_000)], None)
                .await,
            Err(OrderFlowError::ModelNotFound)
        ));
        assert!(matches!(
            flow.request_confirmation(&buyer, vec![draft_item(4, 1_000)], None)
                .await,
            Err(OrderFlowError::ModelNotFound)
        ));
    }

    #[tokio::test]
    async fn test_discount_resolves_and_rounds() {
        let store = Arc::new(
            MockStore::new(vec![vehicle(3, "GT Coupe", 5, true)])
                .with_discount("THANKYOU", 2, "Thank you discount"),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(store, Arc::clone(&notifier));
        let buyer = buyer(1);

        // Lowercase input resolves against the uppercase stored code.
        flow.request_confirmation(&buyer, vec![draft_item(3, 120_000)], Some("thankyou"))
            .await
            .unwrap();

        let order = flow.confirm(&buyer, "123456").await.unwrap();
        assert_eq!(order.total_amount, Decimal::from(120_000));
        assert_eq!(order.discounted_total, Decimal::from(117_600));
        assert_eq!(order.discount.unwrap().code, "THANKYOU");
    }

    #[tokio::test]
    async fn test_unknown_discount_rejected() {
        let store = Arc::new(MockStore::new(vec![vehicle(3, "GT Coupe", 5, true)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(store, notifier);

        assert!(matches!(
            flow.request_confirmation(&buyer(1), vec![draft_item(3, 120_000)], Some("NOPE"))
                .await,
            Err(OrderFlowError::UnknownDiscount)
        ));
    }

    #[tokio::test]
    async fn test_out_of_stock_keeps_entry_and_sends_no_receipt() {
        let store = Arc::new(MockStore::new(vec![vehicle(3, "GT Coupe", 0, true)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(Arc::clone(&store), Arc::clone(&notifier));
        let buyer = buyer(1);

        flow.request_confirmation(&buyer, vec![draft_item(3, 120_000)], None)
            .await
            .unwrap();

        let err = flow.confirm(&buyer, "123456").await.unwrap_err();
        assert!(matches!(err, OrderFlowError::OutOfStock { .. }));
        assert_eq!(store.persisted_count(), 0);
        assert_eq!(notifier.sent_count(), 1);

        // Restock and the same pending entry confirms fine.
        store
            .vehicles
            .lock()
            .unwrap()
            .get_mut(&VehicleId::new(3))
            .unwrap()
            .stock = 1;
        flow.confirm(&buyer, "123456").await.unwrap();
        assert_eq!(store.persisted_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_pin_send_surfaces_but_entry_survives() {
        let store = Arc::new(MockStore::new(vec![vehicle(3, "GT Coupe", 5, true)]));
        let notifier = Arc::new(RecordingNotifier::default());
        notifier
            .fail
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let flow = flow_with(store, Arc::clone(&notifier));
        let buyer = buyer(1);

        assert!(matches!(
            flow.request_confirmation(&buyer, vec![draft_item(3, 120_000)], None)
                .await,
            Err(OrderFlowError::Email(_))
        ));

        // The draft was cached before the send, so its PIN still confirms.
        notifier
            .fail
            .store(false, std::sync::atomic::Ordering::SeqCst);
        flow.confirm(&buyer, "123456").await.unwrap();
    }

    #[tokio::test]
    async fn test_new_request_replaces_old_draft() {
        let store = Arc::new(MockStore::new(vec![
            vehicle(3, "GT Coupe", 5, true),
            vehicle(4, "Roadster", 5, true),
        ]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(store, notifier);
        let buyer = buyer(1);

        flow.request_confirmation(&buyer, vec![draft_item(3, 120_000)], None)
            .await
            .unwrap();
        flow.request_confirmation(
            &buyer,
            vec![draft_item(3, 120_000), draft_item(4, 90_000)],
            None,
        )
        .await
        .unwrap();

        let order = flow.confirm(&buyer, "123456").await.unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_amount, Decimal::from(210_000));
    }

    #[tokio::test]
    async fn test_last_unit_goes_to_one_buyer_only() {
        let store = Arc::new(MockStore::new(vec![vehicle(3, "GT Coupe", 1, true)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let flow = flow_with(Arc::clone(&store), notifier);
        let (first, second) = (buyer(1), buyer(2));

        flow.request_confirmation(&first, vec![draft_item(3, 120_000)], None)
            .await
            .unwrap();
        flow.request_confirmation(&second, vec![draft_item(3, 120_000)], None)
            .await
            .unwrap();

        flow.confirm(&first, "123456").await.unwrap();
        assert!(matches!(
            flow.confirm(&second, "123456").await,
            Err(OrderFlowError::OutOfStock { .. })
        ));
        assert_eq!(store.stock_of(3), 0);
        assert_eq!(store.persisted_count(), 1);
    }

    #[test]
    fn test_accepts_rejects_expired_pin_even_when_matching() {
        let confirmation = PendingConfirmation {
            items: Vec::new(),
            discount: None,
            total: Decimal::ZERO,
            discounted_total: Decimal::ZERO,
            pin: "123456".to_owned(),
            expires_at: Utc::now() - ChronoDuration::seconds(1),
        };

        assert!(!confirmation.accepts("123456", Utc::now()));
    }

    #[test]
    fn test_accepts_matching_unexpired_pin() {
        let confirmation = PendingConfirmation {
            items: Vec::new(),
            discount: None,
            total: Decimal::ZERO,
            discounted_total: Decimal::ZERO,
            pin: "123456".to_owned(),
            expires_at: Utc::now() + ChronoDuration::minutes(5),
        };

        assert!(confirmation.accepts("123456", Utc::now()));
        assert!(!confirmation.accepts("654321", Utc::now()));
    }

    #[test]
    fn test_join_modifications() {
        assert_eq!(
            join_modifications(&serde_json::json!({"exhaust": "Sport", "wheels": "Forged"})),
            "Sport, Forged"
        );
        assert_eq!(join_modifications(&serde_json::json!({})), "None");
        assert_eq!(join_modifications(&serde_json::Value::Null), "None");
    }
}
