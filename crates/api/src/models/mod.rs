//! Database row types and API response shapes.
//!
//! Row structs derive `sqlx::FromRow` and map 1:1 onto tables. Response
//! structs serialize with camelCase field names, matching what the
//! storefront frontend expects. Request payloads live next to the route
//! handlers that consume them.

pub mod appointment;
pub mod contact;
pub mod customization;
pub mod discount;
pub mod order;
pub mod registration;
pub mod user;
pub mod vehicle;

pub use appointment::Appointment;
pub use contact::ContactMessage;
pub use customization::Customization;
pub use discount::Discount;
pub use order::{DiscountSnapshot, Order, OrderItem, OrderResponse};
pub use registration::{PasswordResetPin, PendingRegistration};
pub use user::{AuthUser, User, UserResponse};
pub use vehicle::{Specifications, Vehicle, VehicleResponse};
