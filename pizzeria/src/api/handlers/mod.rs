//! Axum handlers for the HTTP API.

pub mod auth;
pub mod orders;
