#![cfg(test)]
use std::sync::Arc;

use models::user::{Role, User};

use crate::auth::domain::OAuthProfile;
use crate::auth::SessionUser;
use crate::registry::Services;
use crate::storage::{CollectionStore, MemoryCollectionStore};

pub fn profile(email: &str) -> OAuthProfile {
    OAuthProfile { email: email.into(), name: Some("Test User".into()), picture: None, email_verified: Some(true) }
}

pub fn session(user: &User) -> SessionUser {
    SessionUser::from(user)
}

/// Fresh in-memory services with one account per role.
pub struct Fixture {
    pub services: Services,
    pub admin: SessionUser,
    pub customer: SessionUser,
    pub other_customer: SessionUser,
    pub team: SessionUser,
    pub other_team: SessionUser,
}

pub async fn fixture() -> Result<Fixture, anyhow::Error> {
    fixture_on(Arc::new(MemoryCollectionStore::new())).await
}

/// Same accounts over a caller-supplied store.
pub async fn fixture_on(store: Arc<dyn CollectionStore>) -> Result<Fixture, anyhow::Error> {
    let services = Services::new(store);
    let admins = vec!["admin@studio.test".to_string()];
    let users = &services.users;

    let admin = users.upsert_from_profile(&profile("admin@studio.test"), &admins).await?;
    let admin = session(&admin);
    let customer = session(&users.upsert_from_profile(&profile("bride@example.com"), &admins).await?);
    let other_customer = session(&users.upsert_from_profile(&profile("groom@example.com"), &admins).await?);

    let mut team_members = Vec::new();
    for email in ["lens@studio.test", "drone@studio.test"] {
        let u = users.upsert_from_profile(&profile(email), &admins).await?;
        let u = users.update_role(&admin, &u.id, Role::Team).await?;
        team_members.push(session(&u));
    }
    let other_team = team_members.pop().ok_or_else(|| anyhow::anyhow!("team fixture"))?;
    let team = team_members.pop().ok_or_else(|| anyhow::anyhow!("team fixture"))?;

    Ok(Fixture { services, admin, customer, other_customer, team, other_team })
}
