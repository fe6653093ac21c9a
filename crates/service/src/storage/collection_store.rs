use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::ServiceError;

/// Whole-document collection store.
///
/// A collection is a named JSON array that is always read and written in full.
/// Implementations can be file-backed, in-memory, or a remote document service.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Read the whole collection; a collection that was never saved is empty.
    async fn get_collection(&self, name: &str) -> Result<Vec<Value>, ServiceError>;
    /// Replace the whole collection.
    async fn save_collection(&self, name: &str, items: Vec<Value>) -> Result<(), ServiceError>;
}

/// Typed read of a collection.
pub async fn load<T: DeserializeOwned>(store: &dyn CollectionStore, name: &str) -> Result<Vec<T>, ServiceError> {
    store
        .get_collection(name)
        .await?
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(|e| ServiceError::Storage(format!("corrupt record in {name}: {e}"))))
        .collect()
}

/// Typed write of a collection.
pub async fn save<T: Serialize>(store: &dyn CollectionStore, name: &str, items: &[T]) -> Result<(), ServiceError> {
    let values = items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ServiceError::storage)?;
    store.save_collection(name, values).await
}

/// Process-local store, used by tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryCollectionStore {
    inner: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl CollectionStore for MemoryCollectionStore {
    async fn get_collection(&self, name: &str) -> Result<Vec<Value>, ServiceError> {
        let map = self.inner.read().await;
        Ok(map.get(name).cloned().unwrap_or_default())
    }

    async fn save_collection(&self, name: &str, items: Vec<Value>) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        map.insert(name.to_string(), items);
        Ok(())
    }
}
