//! Appointment booking route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use prestige_core::{AppointmentId, AppointmentStatus, ServiceType, VehicleId};

use crate::db::appointments::NewAppointment;
use crate::db::{AppointmentRepository, VehicleRepository};
use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, CurrentUser};
use crate::state::AppState;

/// Parse and normalize an `HH:MM` time of day.
///
/// A single-digit hour is accepted and zero-padded so slot comparisons
/// work on one canonical form.
fn parse_time(raw: &str) -> Option<String> {
    let (hour, minute) = raw.split_once(':')?;
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return None;
    }

    let hour: u8 = hour.parse().ok()?;
    let minute_value: u8 = minute.parse().ok()?;
    if hour > 23 || minute_value > 59 {
        return None;
    }

    Some(format!("{hour:02}:{minute}"))
}

fn parse_service_type(raw: &str) -> Option<ServiceType> {
    match raw {
        "consultation" => Some(ServiceType::Consultation),
        "test-drive" => Some(ServiceType::TestDrive),
        "customization" => Some(ServiceType::Customization),
        "maintenance" => Some(ServiceType::Maintenance),
        _ => None,
    }
}

fn parse_status(raw: &str) -> Option<AppointmentStatus> {
    match raw {
        "pending" => Some(AppointmentStatus::Pending),
        "confirmed" => Some(AppointmentStatus::Confirmed),
        "cancelled" => Some(AppointmentStatus::Cancelled),
        "completed" => Some(AppointmentStatus::Completed),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub service_type: Option<String>,
    pub vehicle_id: Option<VehicleId>,
    pub notes: Option<String>,
}

/// Book a showroom appointment.
///
/// POST /appointments
#[instrument(skip(state, user, request))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse> {
    let date = request
        .date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .ok_or_else(|| AppError::BadRequest("Valid date is required".to_owned()))?;
    let time = request
        .time
        .as_deref()
        .and_then(parse_time)
        .ok_or_else(|| AppError::BadRequest("Valid time is required".to_owned()))?;
    let service_type = request
        .service_type
        .as_deref()
        .and_then(parse_service_type)
        .ok_or_else(|| AppError::BadRequest("Invalid service type".to_owned()))?;

    if let Some(vehicle_id) = request.vehicle_id {
        VehicleRepository::new(state.pool())
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Model not found".to_owned()))?;
    }

    let repository = AppointmentRepository::new(state.pool());
    if repository.slot_taken(date, &time).await? {
        return Err(AppError::Conflict(
            "This time slot is already booked".to_owned(),
        ));
    }

    let appointment = repository
        .create(&NewAppointment {
            user_id: user.id,
            service_type,
            date,
            time: &time,
            vehicle_id: request.vehicle_id,
            notes: request.notes.as_deref(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// List every appointment, ordered by date then time.
///
/// GET /appointments
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<impl IntoResponse> {
    let appointments = AppointmentRepository::new(state.pool()).list_all().await?;
    Ok(Json(appointments))
}

/// List the caller's appointments.
///
/// GET /appointments/my-appointments
pub async fn my_appointments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    let appointments = AppointmentRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(appointments))
}

/// Fetch one appointment. Owners see their own; admins see any.
///
/// GET /appointments/{id}
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<impl IntoResponse> {
    let appointment = AppointmentRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_owned()))?;

    if !user.role.is_admin() && appointment.user_id != user.id {
        return Err(AppError::Forbidden("Not authorized".to_owned()));
    }

    Ok(Json(appointment))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// Set an appointment's status.
///
/// PUT /appointments/{id}/status
#[instrument(skip(state, request))]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<AppointmentId>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse> {
    let status = request
        .status
        .as_deref()
        .and_then(parse_status)
        .ok_or_else(|| AppError::BadRequest("Invalid status".to_owned()))?;

    let appointment = AppointmentRepository::new(state.pool())
        .update_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_owned()))?;

    Ok(Json(appointment))
}

/// Cancel an appointment, freeing its slot.
///
/// PUT /appointments/{id}/cancel
#[instrument(skip(state, user))]
pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<impl IntoResponse> {
    let repository = AppointmentRepository::new(state.pool());
    let appointment = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_owned()))?;

    if !user.role.is_admin() && appointment.user_id != user.id {
        return Err(AppError::Forbidden("Not authorized".to_owned()));
    }

    let appointment = repository
        .update_status(id, AppointmentStatus::Cancelled)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_owned()))?;

    Ok(Json(appointment))
}
