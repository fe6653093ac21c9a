//! Storage abstractions for service layer
//!
//! `CollectionStore` is the whole-document contract of the external store;
//! `KeyedCollection` layers per-record CRUD with optimistic versioning on top.

pub mod collection_store;
pub mod json_file_store;
pub mod keyed;

pub use collection_store::{CollectionStore, MemoryCollectionStore};
pub use json_file_store::JsonFileStore;
pub use keyed::KeyedCollection;
