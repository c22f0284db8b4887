//! Database record structures matching table schemas.
//!
//! These are distinct from the API models in [`crate::api::models`]: the DB
//! request types carry exactly what the INSERT needs (e.g. a password hash
//! instead of a plaintext password), and the response types mirror the rows.

pub mod orders;
pub mod users;
