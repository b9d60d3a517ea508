//! Vehicle catalog row and response types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use prestige_core::VehicleId;

/// Performance specifications stored as JSONB on the vehicle row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Specifications {
    pub engine: String,
    pub horsepower: i32,
    /// 0-60 mph time as displayed, e.g. `"3.5s"`.
    pub zero_to_sixty: String,
    /// Top speed as displayed, e.g. `"191 mph"`.
    pub top_speed: String,
}

/// A vehicle in the catalog.
///
/// Deleting a vehicle only clears `is_active` so historical orders keep
/// a valid reference.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub year: i32,
    pub base_price: Decimal,
    pub image_url: String,
    pub description: String,
    pub features: Vec<String>,
    pub specifications: Json<Specifications>,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vehicle as returned by the catalog endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: VehicleId,
    pub name: String,
    pub year: i32,
    pub base_price: Decimal,
    pub image_url: String,
    pub description: String,
    pub features: Vec<String>,
    pub specifications: Specifications,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            name: vehicle.name,
            year: vehicle.year,
            base_price: vehicle.base_price,
            image_url: vehicle.image_url,
            description: vehicle.description,
            features: vehicle.features,
            specifications: vehicle.specifications.0,
            stock: vehicle.stock,
            is_active: vehicle.is_active,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_specifications_round_trip_camel_case() {
        let json = serde_json::json!({
            "engine": "4.0L flat-six",
            "horsepower": 502,
            "zeroToSixty": "3.2s",
            "topSpeed": "197 mph"
        });

        let specs: Specifications = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(specs.horsepower, 502);
        assert_eq!(specs.zero_to_sixty, "3.2s");

        assert_eq!(serde_json::to_value(&specs).unwrap(), json);
    }

    #[test]
    fn test_specifications_tolerate_missing_fields() {
        let specs: Specifications = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(specs.engine, "");
        assert_eq!(specs.horsepower, 0);
    }

    #[test]
    fn test_vehicle_response_flattens_specifications() {
        let vehicle = Vehicle {
            id: VehicleId::new(3),
            name: "GT Coupe".to_owned(),
            year: 2026,
            base_price: Decimal::from(185_000),
            image_url: String::new(),
            description: String::new(),
            features: vec!["Ceramic brakes".to_owned()],
            specifications: Json(Specifications {
                engine: "Twin-turbo V8".to_owned(),
                horsepower: 620,
                zero_to_sixty: "3.0s".to_owned(),
                top_speed: "205 mph".to_owned(),
            }),
            stock: 4,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(VehicleResponse::from(vehicle)).unwrap();
        assert_eq!(json["basePrice"], "185000");
        assert_eq!(json["specifications"]["horsepower"], 620);
        assert_eq!(json["isActive"], true);
    }
}
