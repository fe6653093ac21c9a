//! Auth module: OAuth sign-in, session tokens and the resolved session user.
//!
//! The web layer only sees [`AuthService`]; the identity provider sits behind a
//! trait so tests can run the whole sign-in flow without network access.

pub mod domain;
pub mod errors;
pub mod provider;
pub mod session;
pub mod service;

pub use domain::SessionUser;
pub use service::AuthService;
