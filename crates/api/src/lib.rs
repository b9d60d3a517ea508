//! Prestige Motor Works API library.
//!
//! This crate is both a library and a binary. The library exposes the
//! configuration, database, service, and route layers so the CLI and the
//! integration tests can drive them directly; `main.rs` wires everything
//! into the running axum server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
