//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with SQLite.
//! It follows the Repository pattern to provide clean abstractions over
//! database operations.
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Transactions
//!
//! Each API request owns exactly one transaction: the handler begins it,
//! constructs repositories from it, and commits once at the end. Any error
//! path drops the transaction, rolling back every effect:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = Orders::new(&mut tx);
//! // ... operations ...
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/`
//! directory; [`crate::migrator`] provides access to the migrator.

pub mod errors;
pub mod handlers;
pub mod models;
