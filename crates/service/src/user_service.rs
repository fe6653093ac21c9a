use std::sync::Arc;

use chrono::Utc;
use models::user::{normalize_email, ProfilePatch, Role, User};
use tracing::{info, instrument};

use crate::auth::domain::OAuthProfile;
use crate::auth::SessionUser;
use crate::authz::{self, Action, Resource, Scope};
use crate::errors::ServiceError;
use crate::storage::{CollectionStore, KeyedCollection};

/// User accounts: sign-in upsert, profile edits and admin role management.
pub struct UserService {
    users: KeyedCollection<User>,
}

impl UserService {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { users: KeyedCollection::new(store) }
    }

    /// Unscoped lookup for internal callers (session resolution, referential checks).
    pub async fn find(&self, id: &str) -> Result<Option<User>, ServiceError> {
        self.users.get(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let email = normalize_email(email);
        Ok(self.users.all().await?.into_iter().find(|u| u.email == email))
    }

    /// Create the account on first sign-in, refresh name/image afterwards.
    /// The role is only decided at creation; later sign-ins never change it.
    pub async fn upsert_from_profile(&self, profile: &OAuthProfile, admin_emails: &[String]) -> Result<User, ServiceError> {
        let email = normalize_email(&profile.email);
        let bootstrap_admin = admin_emails.iter().any(|e| normalize_email(e) == email);
        self.users
            .with_items(|items| {
                if let Some(existing) = items.iter_mut().find(|u| u.email == email) {
                    if let Some(name) = profile.name.as_ref().filter(|n| !n.trim().is_empty()) {
                        existing.name = Some(name.clone());
                    }
                    if profile.picture.is_some() {
                        existing.image = profile.picture.clone();
                    }
                    existing.updated_at = Utc::now();
                    existing.version += 1;
                    return Ok(existing.clone());
                }
                let role = if bootstrap_admin { Role::Admin } else { Role::Customer };
                let mut user = User::new(&email, profile.name.clone(), profile.picture.clone(), role)?;
                user.version = 1;
                items.push(user.clone());
                info!(user_id = %user.id, %role, event = "user_created", "first sign-in");
                Ok(user)
            })
            .await
    }

    /// Admin listing, optionally narrowed to one role.
    pub async fn list(&self, actor: &SessionUser, role: Option<Role>) -> Result<Vec<User>, ServiceError> {
        authz::authorize(actor.role, Resource::User, Action::List)?;
        let mut users: Vec<User> = self
            .users
            .all()
            .await?
            .into_iter()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    pub async fn get(&self, actor: &SessionUser, id: &str) -> Result<User, ServiceError> {
        let scope = authz::authorize(actor.role, Resource::User, Action::Read)?;
        if scope == Scope::Own && actor.id != id {
            return Err(ServiceError::forbidden());
        }
        self.users.require(id).await
    }

    #[instrument(skip(self, actor, patch), fields(actor = %actor.id))]
    pub async fn update_profile(
        &self,
        actor: &SessionUser,
        id: &str,
        patch: ProfilePatch,
        expected_version: Option<u64>,
    ) -> Result<User, ServiceError> {
        let updated = self
            .users
            .update(id, expected_version, |u| {
                authz::ensure_profile_edit(actor, u)?;
                u.apply_profile(patch)?;
                Ok(())
            })
            .await?;
        info!(user_id = %updated.id, event = "profile_updated", "user profile updated");
        Ok(updated)
    }

    /// Returns the updated user; callers handle side effects of demotion (team unassignment).
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn update_role(&self, actor: &SessionUser, id: &str, role: Role) -> Result<User, ServiceError> {
        let updated = self
            .users
            .update(id, None, |u| {
                authz::ensure_role_change(actor, u, role)?;
                u.set_role(role);
                Ok(())
            })
            .await?;
        info!(user_id = %updated.id, role = %updated.role, event = "role_changed", "user role changed");
        Ok(updated)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete(&self, actor: &SessionUser, id: &str) -> Result<User, ServiceError> {
        let removed = self.users.remove_with(id, |u| authz::ensure_account_delete(actor, u)).await?;
        info!(user_id = %removed.id, event = "user_deleted", "user deleted");
        Ok(removed)
    }

    /// Every id must name an existing team member.
    pub async fn ensure_team_members(&self, ids: &[String]) -> Result<(), ServiceError> {
        if ids.is_empty() {
            return Ok(());
        }
        let users = self.users.all().await?;
        for id in ids {
            match users.iter().find(|u| &u.id == id) {
                Some(u) if u.role == Role::Team => {}
                Some(_) => return Err(ServiceError::Validation(format!("user {id} is not a team member"))),
                None => return Err(ServiceError::Validation(format!("unknown team member: {id}"))),
            }
        }
        Ok(())
    }

    pub async fn count_by_role(&self, role: Role) -> Result<usize, ServiceError> {
        Ok(self.users.all().await?.iter().filter(|u| u.role == role).count())
    }
}
