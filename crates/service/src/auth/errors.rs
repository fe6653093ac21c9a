use thiserror::Error;

use crate::errors::ServiceError;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not signed in or session expired")]
    Unauthorized,
    #[error("oauth state mismatch")]
    InvalidState,
    #[error("identity provider error: {0}")]
    Provider(String),
    #[error("token error: {0}")]
    Token(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Unauthorized => 1004,
            AuthError::InvalidState => 1005,
            AuthError::Provider(_) => 1103,
            AuthError::Token(_) => 1102,
            AuthError::Service(_) => 1200,
        }
    }
}
