//! Permission checking: the self-or-admin rule.
//!
//! Every order-reading and order-mutating operation applies
//! [`require_self_or_admin`] against the order's owner; listing all orders
//! applies [`require_admin`]. A failed check is `Forbidden` (403) - distinct
//! from a token-verification failure, which is `Unauthenticated` (401).

use crate::{api::models::users::CurrentUser, errors::Error, types::UserId};

/// Allow the operation iff the caller owns the resource or is an admin.
pub fn require_self_or_admin(caller: &CurrentUser, owner_id: UserId, action: &'static str, resource: String) -> Result<(), Error> {
    if caller.is_admin || caller.id == owner_id {
        Ok(())
    } else {
        Err(Error::Forbidden { action, resource })
    }
}

/// Allow the operation only for admins.
pub fn require_admin(caller: &CurrentUser, action: &'static str, resource: String) -> Result<(), Error> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(Error::Forbidden { action, resource })
    }
}
