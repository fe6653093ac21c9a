use models::user::{Role, User};
use serde::{Deserialize, Serialize};

/// Identity as returned by the OAuth provider's userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OAuthProfile {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

impl From<&User> for SessionUser {
    fn from(u: &User) -> Self {
        SessionUser { id: u.id.clone(), email: u.email.clone(), role: u.role }
    }
}

/// Sign-in result (session)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}
