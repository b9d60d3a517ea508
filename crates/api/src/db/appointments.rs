//! Reads and writes for the appointments table.

use chrono::NaiveDate;
use sqlx::PgPool;

use prestige_core::{AppointmentId, AppointmentStatus, ServiceType, UserId, VehicleId};

use super::RepositoryError;
use crate::models::Appointment;

const APPOINTMENT_COLUMNS: &str = "id, user_id, service_type, date, time, vehicle_id, \
     notes, status, created_at, updated_at";

/// Fields required to book a new appointment.
#[derive(Debug)]
pub struct NewAppointment<'a> {
    pub user_id: UserId,
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time: &'a str,
    pub vehicle_id: Option<VehicleId>,
    pub notes: Option<&'a str>,
}

/// Query handle over the appointments table.
pub struct AppointmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AppointmentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all appointments, ordered by date then time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn list_all(&self) -> Result<Vec<Appointment>, RepositoryError> {
        let appointments = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY date, time"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(appointments)
    }

    /// List a user's appointments, ordered by date then time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Appointment>, RepositoryError> {
        let appointments = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE user_id = $1 ORDER BY date, time"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(appointments)
    }

    /// Get an appointment by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn find_by_id(
        &self,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(appointment)
    }

    /// Check whether a date and time slot is already booked.
    ///
    /// Cancelled appointments don't hold their slot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn slot_taken(&self, date: NaiveDate, time: &str) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
                 SELECT 1 FROM appointments \
                 WHERE date = $1 AND time = $2 AND status <> $3 \
             )",
        )
        .bind(date)
        .bind(time)
        .bind(AppointmentStatus::Cancelled)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Book a new appointment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn create(
        &self,
        appointment: &NewAppointment<'_>,
    ) -> Result<Appointment, RepositoryError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            "INSERT INTO appointments \
                 (user_id, service_type, date, time, vehicle_id, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(appointment.user_id)
        .bind(appointment.service_type)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(appointment.vehicle_id)
        .bind(appointment.notes)
        .fetch_one(self.pool)
        .await?;

        Ok(appointment)
    }

    /// Change an appointment's status.
    ///
    /// Returns the updated appointment, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` when the query fails.
    pub async fn update_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        Ok(appointment)
    }
}
