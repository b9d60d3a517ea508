//! Prestige Core - Shared domain types.
//!
//! Domain vocabulary for the Prestige Motor Works services: typed row
//! ids, the validated [`Email`] newtype, money arithmetic on
//! `rust_decimal`, and the status/role enums. Both the `api` server and
//! the `cli` tools build on it.
//!
//! Deliberately free of I/O: no database access, no HTTP, no clocks.
//! The one nod to persistence is the optional `postgres` feature, which
//! adds transparent sqlx codecs to the newtypes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
