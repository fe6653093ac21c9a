use serde::{de::DeserializeOwned, Serialize};

/// A document stored inside a named collection.
///
/// Every record carries an id that is unique within its collection and a
/// monotonically increasing `version` used for optimistic concurrency.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name inside the document store.
    const COLLECTION: &'static str;
    /// Singular name used in error messages.
    const ENTITY: &'static str;

    fn id(&self) -> &str;
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
}

/// New opaque record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Implements [`Record`] for a struct with `id: String` and `version: u64` fields.
#[macro_export]
macro_rules! impl_record {
    ($ty:ty, $collection:expr, $entity:expr) => {
        impl $crate::record::Record for $ty {
            const COLLECTION: &'static str = $collection;
            const ENTITY: &'static str = $entity;
            fn id(&self) -> &str { &self.id }
            fn version(&self) -> u64 { self.version }
            fn set_version(&mut self, version: u64) { self.version = version; }
        }
    };
}
