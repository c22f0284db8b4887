//! Request and response models for the HTTP API.

pub mod auth;
pub mod orders;
pub mod users;
