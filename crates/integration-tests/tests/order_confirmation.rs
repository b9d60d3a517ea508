//! Integration tests for the two-step PIN purchase flow.
//!
//! Requesting a confirmation parks the draft under an emailed PIN;
//! confirming checks the PIN, persists the order, and decrements stock.
//! These tests cover the seams between the flow, the store, and the
//! notifier using the in-memory harness.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use prestige_api::services::email::Notifier;
use prestige_api::services::orders::{OrderFlow, OrderFlowError, OrderStore, PendingConfirmation};
use prestige_core::VehicleId;
use prestige_integration_tests::{MemoryOrderStore, RecordingNotifier, buyer, draft, vehicle};

fn flow(store: &Arc<MemoryOrderStore>, notifier: &Arc<RecordingNotifier>) -> OrderFlow {
    OrderFlow::new(
        Arc::clone(store) as Arc<dyn OrderStore>,
        Arc::clone(notifier) as Arc<dyn Notifier>,
    )
    .with_pin_source(|| "123456".to_owned())
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn test_request_sends_pin_but_persists_nothing() {
    let store = Arc::new(MemoryOrderStore::new(vec![vehicle(1, "GT Coupe", 3)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = flow(&store, &notifier);
    let ava = buyer(1, "Ava", "Marsh", "ava@example.com");

    flow.request_confirmation(&ava, vec![draft(1, 120_000)], None)
        .await
        .expect("request should succeed");

    let sent = notifier.sent();
    let pin_email = sent.first().expect("one email sent");
    assert_eq!(pin_email.subject, "Confirm Your Prestige Motor Works Purchase");
    assert!(pin_email.text.contains("Your confirmation PIN is: 123456"));
    assert_eq!(pin_email.to.as_str(), "ava@example.com");

    // Nothing happens to the catalog until the PIN comes back.
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.stock_of(VehicleId::new(1)), 3);
}

#[tokio::test]
async fn test_confirm_persists_order_and_sends_receipt() {
    let store = Arc::new(
        MemoryOrderStore::new(vec![
            vehicle(1, "GT Coupe", 3),
            vehicle(2, "Roadster S", 2),
        ])
        .with_discount("THANKYOU", 2, "Thank you discount"),
    );
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = flow(&store, &notifier);
    let ava = buyer(1, "Ava", "Marsh", "ava@example.com");

    flow.request_confirmation(
        &ava,
        vec![draft(1, 117_100), draft(2, 95_500)],
        Some("thankyou"),
    )
    .await
    .expect("request should succeed");

    let order = flow
        .confirm(&ava, "123456")
        .await
        .expect("confirm should succeed");

    assert_eq!(order.user_name, "Ava Marsh");
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total_amount, Decimal::from(212_600));
    // 2% off 212,600 is exact, no rounding needed.
    assert_eq!(order.discounted_total, Decimal::from(208_348));
    let snapshot = order.discount.expect("discount snapshot");
    assert_eq!(snapshot.code, "THANKYOU");
    assert_eq!(snapshot.percentage, 2);

    assert_eq!(store.stock_of(VehicleId::new(1)), 2);
    assert_eq!(store.stock_of(VehicleId::new(2)), 1);
    assert_eq!(store.order_count(), 1);

    // The receipt goes out from a background task after the response.
    notifier.wait_for(2).await;
    let sent = notifier.sent();
    let receipt = sent.last().expect("receipt sent");
    assert_eq!(
        receipt.subject,
        "Your Prestige Motor Works Order Receipt & Thank You!"
    );
    assert!(receipt.text.contains("Your order has been confirmed!"));
}

// =============================================================================
// Stock Contention
// =============================================================================

#[tokio::test]
async fn test_last_unit_race_confirms_exactly_one_order() {
    let store = Arc::new(MemoryOrderStore::new(vec![vehicle(1, "GT Coupe", 1)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = flow(&store, &notifier);
    let ava = buyer(1, "Ava", "Marsh", "ava@example.com");
    let ben = buyer(2, "Ben", "Okafor", "ben@example.com");

    flow.request_confirmation(&ava, vec![draft(1, 120_000)], None)
        .await
        .expect("first request");
    flow.request_confirmation(&ben, vec![draft(1, 120_000)], None)
        .await
        .expect("second request");

    // Both confirmations run concurrently; the decrement guard must let
    // exactly one through.
    let (first, second) = tokio::join!(
        flow.confirm(&ava, "123456"),
        flow.confirm(&ben, "123456"),
    );

    let successes = usize::from(first.is_ok()) + usize::from(second.is_ok());
    assert_eq!(successes, 1);

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser, Err(OrderFlowError::OutOfStock { .. })));

    assert_eq!(store.stock_of(VehicleId::new(1)), 0);
    assert_eq!(store.order_count(), 1);
}

#[tokio::test]
async fn test_sold_out_confirmation_leaves_draft_retryable() {
    let store = Arc::new(MemoryOrderStore::new(vec![vehicle(1, "GT Coupe", 0)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = flow(&store, &notifier);
    let ava = buyer(1, "Ava", "Marsh", "ava@example.com");

    flow.request_confirmation(&ava, vec![draft(1, 120_000)], None)
        .await
        .expect("request");

    let err = flow
        .confirm(&ava, "123456")
        .await
        .expect_err("sold out must fail");
    match err {
        OrderFlowError::OutOfStock { model } => assert_eq!(model, "GT Coupe"),
        other => panic!("expected OutOfStock, got {other:?}"),
    }

    // Restocking lets the same pending draft go through.
    store.set_stock(VehicleId::new(1), 1);
    flow.confirm(&ava, "123456").await.expect("retry succeeds");
    assert_eq!(store.order_count(), 1);
}

// =============================================================================
// PIN Lifecycle
// =============================================================================

static REPLACEMENT_PIN: AtomicU32 = AtomicU32::new(111_111);

fn next_replacement_pin() -> String {
    format!("{:06}", REPLACEMENT_PIN.fetch_add(1, Ordering::SeqCst))
}

#[tokio::test]
async fn test_new_request_invalidates_the_previous_pin() {
    let store = Arc::new(MemoryOrderStore::new(vec![vehicle(1, "GT Coupe", 5)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = OrderFlow::new(
        Arc::clone(&store) as Arc<dyn OrderStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    )
    .with_pin_source(next_replacement_pin);
    let ava = buyer(1, "Ava", "Marsh", "ava@example.com");

    flow.request_confirmation(&ava, vec![draft(1, 120_000)], None)
        .await
        .expect("first request");
    flow.request_confirmation(&ava, vec![draft(1, 120_000)], None)
        .await
        .expect("second request");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    let old_pin = "111111";
    let new_pin = "111112";
    assert!(sent.first().expect("first email").text.contains(old_pin));
    assert!(sent.last().expect("second email").text.contains(new_pin));

    // The replaced draft's PIN no longer confirms anything.
    assert!(matches!(
        flow.confirm(&ava, old_pin).await,
        Err(OrderFlowError::InvalidPin)
    ));
    flow.confirm(&ava, new_pin).await.expect("fresh PIN works");
}

#[tokio::test]
async fn test_wrong_pin_is_retryable_until_consumed() {
    let store = Arc::new(MemoryOrderStore::new(vec![vehicle(1, "GT Coupe", 5)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = flow(&store, &notifier);
    let ava = buyer(1, "Ava", "Marsh", "ava@example.com");

    flow.request_confirmation(&ava, vec![draft(1, 120_000)], None)
        .await
        .expect("request");

    assert!(matches!(
        flow.confirm(&ava, "999999").await,
        Err(OrderFlowError::InvalidPin)
    ));
    flow.confirm(&ava, "123456").await.expect("correct PIN");

    // Consumed: the same PIN cannot confirm twice.
    assert!(matches!(
        flow.confirm(&ava, "123456").await,
        Err(OrderFlowError::NoPendingOrder)
    ));
}

#[test]
fn test_expired_pin_is_rejected_even_when_matching() {
    let confirmation = PendingConfirmation {
        items: Vec::new(),
        discount: None,
        total: Decimal::ZERO,
        discounted_total: Decimal::ZERO,
        pin: "123456".to_owned(),
        expires_at: Utc::now() - Duration::minutes(1),
    };

    assert!(!confirmation.accepts("123456", Utc::now()));
}

// =============================================================================
// Failure Isolation
// =============================================================================

#[tokio::test]
async fn test_failed_pin_send_keeps_the_draft_alive() {
    let store = Arc::new(MemoryOrderStore::new(vec![vehicle(1, "GT Coupe", 5)]));
    let notifier = Arc::new(RecordingNotifier::default());
    notifier.set_failing(true);
    let flow = flow(&store, &notifier);
    let ava = buyer(1, "Ava", "Marsh", "ava@example.com");

    assert!(matches!(
        flow.request_confirmation(&ava, vec![draft(1, 120_000)], None)
            .await,
        Err(OrderFlowError::Email(_))
    ));

    // The draft was cached before the send, so the PIN still confirms.
    notifier.set_failing(false);
    flow.confirm(&ava, "123456").await.expect("confirm works");
    assert_eq!(store.order_count(), 1);
}

#[tokio::test]
async fn test_failed_receipt_does_not_fail_the_confirmation() {
    let store = Arc::new(MemoryOrderStore::new(vec![vehicle(1, "GT Coupe", 5)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = flow(&store, &notifier);
    let ava = buyer(1, "Ava", "Marsh", "ava@example.com");

    flow.request_confirmation(&ava, vec![draft(1, 120_000)], None)
        .await
        .expect("request");

    // Break the notifier after the PIN went out; the receipt send will
    // fail in the background without touching the result.
    notifier.set_failing(true);
    flow.confirm(&ava, "123456").await.expect("confirm works");
    assert_eq!(store.order_count(), 1);
    assert_eq!(notifier.sent_count(), 1);
}
