//! Common type aliases for entity identifiers.
//!
//! All entity IDs are SQLite rowids (`i64`) wrapped in type aliases for
//! readability at call sites:
//!
//! - [`UserId`]: User account identifier
//! - [`OrderId`]: Order identifier
//! - [`OrderItemId`]: Order line-item identifier

pub type UserId = i64;
pub type OrderId = i64;
pub type OrderItemId = i64;
