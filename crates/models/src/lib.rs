//! Domain entities of the studio portal.
//!
//! Plain serde structs persisted as JSON documents; no storage concerns live here.

pub mod errors;
pub mod record;
pub mod booking;
pub mod package;
pub mod user;
pub mod gallery;
pub mod contact;

pub use record::Record;
