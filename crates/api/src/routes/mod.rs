//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness check
//! GET  /health/ready                 - Readiness check (pings the database)
//!
//! # Auth
//! POST /auth/register                - Start registration, email a PIN
//! POST /auth/verify-pin              - Verify the PIN, create the account
//! POST /auth/resend-pin              - Re-issue the registration PIN
//! POST /auth/cancel-registration     - Abandon a pending registration
//! POST /auth/login                   - Login, returns a bearer token
//! GET  /auth/me                      - Current user (auth)
//! GET  /auth/cart                    - Stored cart (auth)
//! POST /auth/cart                    - Replace the cart (auth)
//! DELETE /auth/cart                  - Clear the cart (auth)
//! POST /auth/send-reset-pin          - Email a password-reset PIN
//! POST /auth/verify-reset-pin        - Check a reset PIN
//! POST /auth/change-password         - Reset the password with a PIN
//!
//! # Users
//! GET  /users                        - List users (admin)
//! GET  /users/profile                - Own profile (auth)
//! PUT  /users/profile                - Update own profile (auth)
//! DELETE /users/profile              - Delete own account (auth)
//! PUT  /users/change-password        - Change own password (auth)
//! GET  /users/{id}                   - User detail (admin)
//! PUT  /users/{id}                   - Update a user (admin)
//! DELETE /users/{id}                 - Delete a user (admin)
//! PUT  /users/{id}/role              - Change a user's role (admin)
//!
//! # Vehicles
//! GET  /vehicles                     - Active catalog (public)
//! GET  /vehicles/{id}                - Vehicle detail (public)
//! POST /vehicles                     - Add a vehicle (admin)
//! PUT  /vehicles/{id}                - Update a vehicle (admin)
//! DELETE /vehicles/{id}              - Retire a vehicle (admin, soft)
//! PATCH /vehicles/{id}/stock         - Set stock level (admin)
//!
//! # Orders
//! POST /orders/request-pin           - Park a draft order, email a PIN (auth)
//! POST /orders/verify-pin            - Confirm the order with the PIN (auth)
//! GET  /orders                       - All orders (admin)
//! GET  /orders/my-orders             - Own orders (auth)
//! GET  /orders/{id}                  - Order detail (owner or admin)
//! PUT  /orders/{id}/status           - Advance order status (admin)
//!
//! # Discounts
//! GET  /discounts/verify?code=       - Check a code (public)
//! GET  /discounts                    - List codes (admin)
//! POST /discounts                    - Create a code (admin)
//! PUT  /discounts/{id}               - Update a code (admin)
//! DELETE /discounts/{id}             - Delete a code (admin)
//!
//! # Appointments
//! POST /appointments                 - Book a slot (auth)
//! GET  /appointments                 - All appointments (admin)
//! GET  /appointments/my-appointments - Own appointments (auth)
//! GET  /appointments/{id}            - Detail (owner or admin)
//! PUT  /appointments/{id}/status     - Set status (admin)
//! PUT  /appointments/{id}/cancel     - Cancel (owner or admin)
//!
//! # Customizations
//! GET  /customizations               - Full catalog (public)
//! GET  /customizations/{id}          - Detail (public)
//! GET  /customizations/category/{category}   - By category (public)
//! GET  /customizations/vehicle/{vehicleId}   - Compatible with a vehicle (public)
//! POST /customizations               - Create (admin)
//! PUT  /customizations/{id}          - Update (admin)
//! DELETE /customizations/{id}        - Delete (admin)
//!
//! # Contact
//! POST /contact                      - Submit a message (public)
//! GET  /contact                      - List messages (admin)
//! ```

pub mod appointments;
pub mod auth;
pub mod contact;
pub mod customizations;
pub mod discounts;
pub mod orders;
pub mod users;
pub mod vehicles;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::state::AppState;

/// Assemble the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/vehicles", vehicle_routes())
        .nest("/orders", order_routes())
        .nest("/discounts", discount_routes())
        .nest("/appointments", appointment_routes())
        .nest("/customizations", customization_routes())
        .nest("/contact", contact_routes())
}

/// Routes under `/auth`: registration, login, cart, password reset.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify-pin", post(auth::verify_pin))
        .route("/resend-pin", post(auth::resend_pin))
        .route("/cancel-registration", post(auth::cancel_registration))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route(
            "/cart",
            get(auth::get_cart)
                .post(auth::update_cart)
                .delete(auth::clear_cart),
        )
        .route("/send-reset-pin", post(auth::send_reset_pin))
        .route("/verify-reset-pin", post(auth::verify_reset_pin))
        .route("/change-password", post(auth::change_password))
}

/// Routes under `/users`: profiles and admin account management.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route(
            "/profile",
            get(users::profile)
                .put(users::update_profile)
                .delete(users::delete_profile),
        )
        .route("/change-password", put(users::change_password))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::remove),
        )
        .route("/{id}/role", put(users::update_role))
}

/// Routes under `/vehicles`: the public catalog plus admin edits.
pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(vehicles::list).post(vehicles::create))
        .route(
            "/{id}",
            get(vehicles::show)
                .put(vehicles::update)
                .delete(vehicles::remove),
        )
        .route("/{id}/stock", patch(vehicles::set_stock))
}

/// Routes under `/orders`: the two-step purchase flow and order reads.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/request-pin", post(orders::request_pin))
        .route("/verify-pin", post(orders::verify_pin))
        .route("/", get(orders::list))
        .route("/my-orders", get(orders::my_orders))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
}

/// Routes under `/discounts`: public code checks plus admin CRUD.
pub fn discount_routes() -> Router<AppState> {
    Router::new()
        .route("/verify", get(discounts::verify))
        .route("/", get(discounts::list).post(discounts::create))
        .route(
            "/{id}",
            put(discounts::update).delete(discounts::remove),
        )
}

/// Routes under `/appointments`: booking and status management.
pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(appointments::list).post(appointments::create))
        .route("/my-appointments", get(appointments::my_appointments))
        .route("/{id}", get(appointments::show))
        .route("/{id}/status", put(appointments::update_status))
        .route("/{id}/cancel", put(appointments::cancel))
}

/// Routes under `/customizations`: catalog reads plus admin CRUD.
pub fn customization_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(customizations::list).post(customizations::create),
        )
        .route(
            "/{id}",
            get(customizations::show)
                .put(customizations::update)
                .delete(customizations::remove),
        )
        .route("/category/{category}", get(customizations::by_category))
        .route("/vehicle/{vehicle_id}", get(customizations::for_vehicle))
}

/// Routes under `/contact`.
pub fn contact_routes() -> Router<AppState> {
    Router::new().route("/", post(contact::create).get(contact::list))
}
