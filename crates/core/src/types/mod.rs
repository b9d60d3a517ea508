//! Core types for Prestige Motor Works.
//!
//! Validated newtypes and enums shared by the API, CLI, and tests.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::discounted_total;
pub use status::*;
