//! Business logic behind the route handlers.
//!
//! - [`auth`] — password hashing, credential checks, JWT issue/verify
//! - [`email`] — outbound mail, templates, and the [`email::Notifier`] seam
//! - [`orders`] — the PIN-confirmed purchase flow
//! - [`pins`] — one-time PIN generation and expiry

pub mod auth;
pub mod email;
pub mod orders;
pub mod pins;
