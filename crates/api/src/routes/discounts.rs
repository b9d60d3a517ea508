//! Discount code route handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use prestige_core::DiscountId;

use crate::db::DiscountRepository;
use crate::db::discounts::{DiscountChanges, NewDiscount};
use crate::error::{AppError, Result};
use crate::middleware::AdminUser;
use crate::state::AppState;

fn validate_percentage(percentage: Option<i16>) -> Result<i16> {
    match percentage {
        Some(p) if (1..=100).contains(&p) => Ok(p),
        _ => Err(AppError::BadRequest(
            "Percentage must be a number between 1 and 100".to_owned(),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub code: Option<String>,
}

/// Check a discount code for the storefront.
///
/// GET /discounts/verify?code=
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<impl IntoResponse> {
    let code = params
        .code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::BadRequest("Discount code is required".to_owned()))?;

    let discount = DiscountRepository::new(state.pool())
        .find_active_by_code(code)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid or inactive discount code".to_owned()))?;

    Ok(Json(json!({
        "percentage": discount.percentage,
        "description": discount.description,
    })))
}

/// List all discount codes, newest first.
///
/// GET /discounts
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let discounts = DiscountRepository::new(state.pool()).list().await?;
    Ok(Json(discounts))
}

#[derive(Debug, Deserialize)]
pub struct CreateDiscountRequest {
    pub code: Option<String>,
    pub percentage: Option<i16>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Add a discount code.
///
/// POST /discounts
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(request): Json<CreateDiscountRequest>,
) -> Result<impl IntoResponse> {
    let code = request
        .code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::BadRequest("Discount code is required".to_owned()))?;
    let percentage = validate_percentage(request.percentage)?;
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::BadRequest("Description is required".to_owned()))?;

    let discount = DiscountRepository::new(state.pool())
        .create(&NewDiscount {
            code,
            percentage,
            description,
            is_active: request.active.unwrap_or(true),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Discount code added successfully",
            "discount": discount,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDiscountRequest {
    pub percentage: Option<i16>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Partially update a discount code. The code itself never changes.
///
/// PUT /discounts/{id}
#[instrument(skip(state, request))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<DiscountId>,
    Json(request): Json<UpdateDiscountRequest>,
) -> Result<impl IntoResponse> {
    let percentage = request
        .percentage
        .map(|p| validate_percentage(Some(p)))
        .transpose()?;
    let description = match request.description.as_deref().map(str::trim) {
        Some("") => {
            return Err(AppError::BadRequest(
                "Description cannot be empty".to_owned(),
            ));
        }
        other => other,
    };

    let discount = DiscountRepository::new(state.pool())
        .update(
            id,
            &DiscountChanges {
                percentage,
                description,
                is_active: request.active,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Discount code not found".to_owned()))?;

    Ok(Json(json!({
        "message": "Discount code updated successfully",
        "discount": discount,
    })))
}

/// Delete a discount code outright.
///
/// DELETE /discounts/{id}
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<DiscountId>,
) -> Result<impl IntoResponse> {
    let deleted = DiscountRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Discount code not found".to_owned()));
    }

    Ok(Json(json!({ "message": "Discount code deleted successfully" })))
}
