//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access (`storage`).
//! - Reuses validation and entity definitions in the `models` crate.
//! - Every operation is checked against the central policy in `authz`.

pub mod errors;
pub mod storage;
pub mod auth;
pub mod authz;
pub mod user_service;
pub mod package_service;
pub mod booking_service;
pub mod gallery_service;
pub mod contact_service;
pub mod stats;
pub mod registry;
pub mod runtime;
#[cfg(test)]
pub mod test_support;

pub use registry::Services;
