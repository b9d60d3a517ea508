//! Order route handlers: the PIN confirmation flow, order history, and
//! admin status management.

use axum::extract::{Path, State};
use axum::{Json, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use prestige_core::{OrderId, OrderStatus, VehicleId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, CurrentUser};
use crate::services::orders::{Buyer, DraftItem};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftItemRequest {
    pub model_id: VehicleId,
    pub color: Option<String>,
    #[serde(default)]
    pub modifications: Value,
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPinRequest {
    #[serde(default)]
    pub items: Vec<DraftItemRequest>,
    pub discount_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPinRequest {
    pub pin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

fn draft_items(items: Vec<DraftItemRequest>) -> Vec<DraftItem> {
    items
        .into_iter()
        .map(|item| DraftItem {
            vehicle_id: item.model_id,
            color: item.color.unwrap_or_default(),
            modifications: item.modifications,
            // A missing price is zero and fails the positive-price check.
            price: item.price.unwrap_or_default(),
        })
        .collect()
}

fn normalized_code(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|code| !code.is_empty())
}

/// Stage a draft order and email the buyer a confirmation PIN.
///
/// POST /orders/request-pin
#[instrument(skip(state, user, request))]
pub async fn request_pin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<RequestPinRequest>,
) -> Result<impl IntoResponse> {
    let buyer = Buyer::from(&user);
    let items = draft_items(request.items);
    let code = normalized_code(request.discount_code.as_deref());

    state
        .orders()
        .request_confirmation(&buyer, items, code)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "A confirmation PIN has been sent to your email."
    })))
}

/// Confirm the pending order with the emailed PIN.
///
/// POST /orders/verify-pin
#[instrument(skip(state, user, request))]
pub async fn verify_pin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<VerifyPinRequest>,
) -> Result<impl IntoResponse> {
    let buyer = Buyer::from(&user);
    let pin = request.pin.as_deref().unwrap_or_default();

    let order = state.orders().confirm(&buyer, pin).await?;

    Ok(Json(json!({
        "message": "Order confirmed and payment completed.",
        "discountedTotal": order.discounted_total,
    })))
}

/// List every order, newest first.
///
/// GET /orders
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// List the caller's orders, newest first.
///
/// GET /orders/my-orders
pub async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// Fetch one order. Owners see their own; admins see any.
///
/// GET /orders/{id}
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    if !user.role.is_admin() && order.user_id != user.id {
        return Err(AppError::Forbidden("Not authorized".to_owned()));
    }

    Ok(Json(order))
}

/// Move an order along its lifecycle.
///
/// PUT /orders/{id}/status
#[instrument(skip(state, request))]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<OrderId>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse> {
    let status: OrderStatus = request
        .status
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid order status".to_owned()))?;

    let repository = OrderRepository::new(state.pool());
    let order = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    if !order.status.can_transition_to(status) {
        return Err(AppError::Conflict(format!(
            "Cannot change order status from {} to {status}",
            order.status
        )));
    }

    let order = repository
        .update_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    Ok(Json(json!({
        "message": "Order updated successfully",
        "order": order,
    })))
}
