//! Appointment row type.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use prestige_core::{AppointmentId, AppointmentStatus, ServiceType, UserId, VehicleId};

/// A booked consultation, test drive, customization session, or service.
///
/// `time` is a normalized `HH:MM` string; the route layer rejects
/// anything else before it reaches the database. A (date, time) slot can
/// only be held by one non-cancelled appointment.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub user_id: UserId,
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time: String,
    pub vehicle_id: Option<VehicleId>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_serializes_camel_case() {
        let appointment = Appointment {
            id: AppointmentId::new(2),
            user_id: UserId::new(9),
            service_type: ServiceType::TestDrive,
            date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            time: "14:30".to_owned(),
            vehicle_id: Some(VehicleId::new(3)),
            notes: None,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&appointment).unwrap();
        assert_eq!(json["serviceType"], "test-drive");
        assert_eq!(json["date"], "2026-09-01");
        assert_eq!(json["time"], "14:30");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["vehicleId"], 3);
    }
}
