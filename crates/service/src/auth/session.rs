use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use models::user::{Role, User};
use serde::{Deserialize, Serialize};

use super::domain::SessionUser;
use super::errors::AuthError;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

/// HS256 signing keys plus session lifetime.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(err = %e, "session token rejected");
            AuthError::Unauthorized
        })?;
        Ok(SessionUser { id: data.claims.sub, email: data.claims.email, role: data.claims.role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User::new("someone@example.com", None, None, role).unwrap()
    }

    #[test]
    fn issue_then_verify_carries_id_and_role() {
        let keys = SessionKeys::new("secret", 12);
        let u = user(Role::Team);
        let token = keys.issue(&u).unwrap();
        let session = keys.verify(&token).unwrap();
        assert_eq!(session.id, u.id);
        assert_eq!(session.role, Role::Team);
    }

    #[test]
    fn wrong_secret_and_garbage_are_unauthorized() {
        let token = SessionKeys::new("a", 12).issue(&user(Role::Admin)).unwrap();
        assert!(matches!(SessionKeys::new("b", 12).verify(&token), Err(AuthError::Unauthorized)));
        assert!(matches!(SessionKeys::new("a", 12).verify("not.a.jwt"), Err(AuthError::Unauthorized)));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        // 负 TTL 直接生成过期 token（超出默认 60s leeway）
        let keys = SessionKeys::new("a", -1);
        let token = keys.issue(&user(Role::Customer)).unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::Unauthorized)));
    }
}
