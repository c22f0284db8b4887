//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection (usually a transaction), provides
//! strongly-typed operations, and returns models from [`crate::db::models`].
//!
//! - [`Users`]: User account storage and email lookup
//! - [`Orders`]: The order aggregate - orders plus their owned line items

pub mod orders;
pub mod repository;
pub mod users;

pub use orders::Orders;
pub use repository::Repository;
pub use users::Users;
