use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, instrument, warn};

use super::domain::{AuthSession, SessionUser};
use super::errors::AuthError;
use super::provider::IdentityProvider;
use super::session::SessionKeys;
use crate::user_service::UserService;

const STATE_LEN: usize = 32;

/// Auth business service independent of web framework
pub struct AuthService {
    users: Arc<UserService>,
    provider: Arc<dyn IdentityProvider>,
    keys: SessionKeys,
    admin_emails: Vec<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<UserService>,
        provider: Arc<dyn IdentityProvider>,
        keys: SessionKeys,
        admin_emails: Vec<String>,
    ) -> Self {
        Self { users, provider, keys, admin_emails }
    }

    pub fn keys(&self) -> &SessionKeys { &self.keys }

    /// Start the OAuth dance: returns `(state, authorize_url)`.
    pub fn begin_sign_in(&self) -> Result<(String, String), AuthError> {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LEN)
            .map(char::from)
            .collect();
        let url = self.provider.authorize_url(&state)?;
        Ok((state, url))
    }

    /// Finish the OAuth dance and open a session.
    ///
    /// First sign-in creates the account as `customer` (or `admin` for bootstrap emails).
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{AuthService, domain::OAuthProfile, provider::mock::StaticProvider, session::SessionKeys};
    /// use service::storage::MemoryCollectionStore;
    /// use service::user_service::UserService;
    /// let users = Arc::new(UserService::new(Arc::new(MemoryCollectionStore::new())));
    /// let provider = StaticProvider::default().with_profile("code-1", OAuthProfile {
    ///     email: "bride@example.com".into(), name: Some("Bea".into()), picture: None, email_verified: Some(true),
    /// });
    /// let auth = AuthService::new(users, Arc::new(provider), SessionKeys::new("secret", 12), vec![]);
    /// let session = tokio_test::block_on(auth.complete_sign_in("code-1", "s", Some("s"))).unwrap();
    /// assert_eq!(session.user.role.as_str(), "customer");
    /// ```
    #[instrument(skip(self, code, state, expected_state))]
    pub async fn complete_sign_in(
        &self,
        code: &str,
        state: &str,
        expected_state: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        match expected_state {
            Some(expected) if !expected.is_empty() && expected == state => {}
            _ => {
                warn!(event = "oauth_state_mismatch", "rejecting oauth callback");
                return Err(AuthError::InvalidState);
            }
        }
        let profile = self.provider.exchange_code(code).await?;
        let user = self.users.upsert_from_profile(&profile, &self.admin_emails).await?;
        let token = self.keys.issue(&user)?;
        info!(user_id = %user.id, role = %user.role, event = "signed_in", "user signed in");
        Ok(AuthSession { user, token })
    }

    /// Resolve a session token to the current user.
    ///
    /// The role is re-read from the user store, so role changes and account
    /// deletion take effect before the token expires.
    pub async fn resolve(&self, token: &str) -> Result<SessionUser, AuthError> {
        let claims = self.keys.verify(token)?;
        let user = self.users.find(&claims.id).await?.ok_or(AuthError::Unauthorized)?;
        Ok(SessionUser::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::OAuthProfile;
    use crate::auth::provider::mock::StaticProvider;
    use crate::storage::MemoryCollectionStore;
    use models::user::Role;

    fn profile(email: &str) -> OAuthProfile {
        OAuthProfile { email: email.into(), name: Some("N".into()), picture: None, email_verified: Some(true) }
    }

    fn setup() -> (Arc<UserService>, AuthService) {
        let users = Arc::new(UserService::new(Arc::new(MemoryCollectionStore::new())));
        let provider = StaticProvider::default()
            .with_profile("c1", profile("owner@studio.com"))
            .with_profile("c2", profile("guest@example.com"));
        let auth = AuthService::new(
            Arc::clone(&users),
            Arc::new(provider),
            SessionKeys::new("test-secret", 12),
            vec!["owner@studio.com".into()],
        );
        (users, auth)
    }

    #[tokio::test]
    async fn sign_in_creates_users_with_default_roles() -> Result<(), anyhow::Error> {
        let (_users, auth) = setup();
        let owner = auth.complete_sign_in("c1", "st", Some("st")).await?;
        assert_eq!(owner.user.role, Role::Admin);
        let guest = auth.complete_sign_in("c2", "st", Some("st")).await?;
        assert_eq!(guest.user.role, Role::Customer);

        // 第二次登录复用同一账号
        let again = auth.complete_sign_in("c2", "st", Some("st")).await?;
        assert_eq!(again.user.id, guest.user.id);

        let resolved = auth.resolve(&guest.token).await?;
        assert_eq!(resolved.id, guest.user.id);
        assert_eq!(resolved.role, Role::Customer);
        Ok(())
    }

    #[tokio::test]
    async fn state_must_match() {
        let (_users, auth) = setup();
        assert!(matches!(auth.complete_sign_in("c2", "a", Some("b")).await, Err(AuthError::InvalidState)));
        assert!(matches!(auth.complete_sign_in("c2", "a", None).await, Err(AuthError::InvalidState)));
        assert!(matches!(auth.complete_sign_in("c2", "", Some("")).await, Err(AuthError::InvalidState)));
    }

    #[tokio::test]
    async fn resolve_uses_current_role_and_rejects_deleted_users() -> Result<(), anyhow::Error> {
        let (users, auth) = setup();
        let admin = auth.complete_sign_in("c1", "s", Some("s")).await?;
        let guest = auth.complete_sign_in("c2", "s", Some("s")).await?;
        let admin_actor = SessionUser::from(&admin.user);

        users.update_role(&admin_actor, &guest.user.id, Role::Team).await?;
        assert_eq!(auth.resolve(&guest.token).await?.role, Role::Team);

        users.delete(&admin_actor, &guest.user.id).await?;
        assert!(matches!(auth.resolve(&guest.token).await, Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[test]
    fn begin_sign_in_generates_fresh_state() {
        let (_users, auth) = setup();
        let (s1, url) = auth.begin_sign_in().unwrap();
        let (s2, _) = auth.begin_sign_in().unwrap();
        assert_eq!(s1.len(), STATE_LEN);
        assert_ne!(s1, s2);
        assert!(url.contains(&s1));
    }
}
