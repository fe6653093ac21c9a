//! Central authorization policy.
//!
//! Every service asks [`authorize`] before touching a collection; the answer is
//! the [`Scope`] of records the caller may act on. Account-level guards for role
//! changes and deletions live here as well so the rules are in one place.

use models::user::{Role, User};
use tracing::warn;

use crate::auth::SessionUser;
use crate::errors::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Booking,
    Package,
    Gallery,
    User,
    Contact,
    Stats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
}

/// Which records an allowed action applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Every record.
    All,
    /// Records owned by the caller (bookings they made, their own account).
    Own,
    /// Bookings whose team includes the caller.
    Assigned,
}

/// Capability table: `None` means the role may not perform the action at all.
fn capability(role: Role, resource: Resource, action: Action) -> Option<Scope> {
    use Action::*;
    use Resource as R;

    if role == Role::Admin {
        return Some(Scope::All);
    }
    match (resource, action, role) {
        (R::Booking, List | Read | Create, Role::Customer) => Some(Scope::Own),
        (R::Booking, List | Read | Update, Role::Team) => Some(Scope::Assigned),

        (R::Package | R::Gallery, List | Read, _) => Some(Scope::All),

        (R::User, Read | Update, _) => Some(Scope::Own),

        // 公开联系表单
        (R::Contact, Create, _) => Some(Scope::All),

        _ => None,
    }
}

/// Decide whether `role` may perform `action` on `resource`.
pub fn authorize(role: Role, resource: Resource, action: Action) -> Result<Scope, ServiceError> {
    capability(role, resource, action).ok_or_else(|| {
        warn!(%role, ?resource, ?action, event = "access_denied", "policy denied request");
        ServiceError::forbidden()
    })
}

/// Role update guard.
///
/// Only admins change roles, never their own, never another admin's, and never
/// to `admin`.
pub fn ensure_role_change(actor: &SessionUser, target: &User, new_role: Role) -> Result<(), ServiceError> {
    authorize(actor.role, Resource::User, Action::Update)?;
    if actor.role != Role::Admin {
        return Err(ServiceError::forbidden());
    }
    if actor.id == target.id {
        return Err(ServiceError::Validation("Cannot change your own role".into()));
    }
    if target.role == Role::Admin {
        return Err(ServiceError::Validation("Cannot modify another admin".into()));
    }
    if new_role == Role::Admin {
        return Err(ServiceError::Validation("Cannot promote users to admin".into()));
    }
    Ok(())
}

/// Account deletion guard. Admin accounts are never deletable, whoever asks.
pub fn ensure_account_delete(actor: &SessionUser, target: &User) -> Result<(), ServiceError> {
    if target.role == Role::Admin {
        return Err(ServiceError::Validation("Cannot delete an admin account".into()));
    }
    authorize(actor.role, Resource::User, Action::Delete)?;
    Ok(())
}

/// Profile edit guard: own account, or an admin editing a non-admin account.
pub fn ensure_profile_edit(actor: &SessionUser, target: &User) -> Result<(), ServiceError> {
    let scope = authorize(actor.role, Resource::User, Action::Update)?;
    let allowed = match scope {
        Scope::All => actor.id == target.id || target.role != Role::Admin,
        Scope::Own => actor.id == target.id,
        Scope::Assigned => false,
    };
    if !allowed {
        return Err(ServiceError::forbidden());
    }
    Ok(())
}
