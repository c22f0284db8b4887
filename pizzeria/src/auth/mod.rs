//! Authentication and authorization system.
//!
//! Authentication is stateless bearer-token auth: clients log in with
//! email/password and receive a pair of signed JWTs (a short-lived access
//! token and a long-lived refresh token). Every protected request presents a
//! token in the `Authorization: Bearer <token>` header; no session state is
//! kept server-side.
//!
//! # Authorization
//!
//! Access control is the self-or-admin rule: a caller may act on an order iff
//! they own it or hold the admin flag. Listing all orders requires admin.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor resolving a bearer token to the authenticated user
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: The self-or-admin predicate and admin requirement
//! - [`token`]: JWT issue and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use pizzeria::api::models::users::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> Result<String, Error> {
//!     Ok(format!("Hello, {}!", user.name))
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod token;
