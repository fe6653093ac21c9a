use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::errors::ServiceError;
use crate::storage::collection_store::CollectionStore;

/// JSON file-backed collection store.
///
/// Each collection lives in `<dir>/<name>.json` as a JSON array. Writes go to a
/// temporary file first and are renamed into place so readers never observe a
/// half-written document.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Initialize the store under a directory. Creates the directory if missing.
    pub async fn new<P: Into<PathBuf>>(dir: P) -> Result<Arc<Self>, ServiceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(ServiceError::storage)?;
        Ok(Arc::new(Self { dir }))
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn path_for(&self, name: &str) -> Result<PathBuf, ServiceError> {
        // 集合名只允许字母数字与 - _，避免路径穿越
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ServiceError::Validation(format!("invalid collection name: {name:?}")));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    async fn get_collection(&self, name: &str) -> Result<Vec<Value>, ServiceError> {
        let path = self.path_for(name)?;
        match fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Storage(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(ServiceError::storage(e)),
        }
    }

    async fn save_collection(&self, name: &str, items: Vec<Value>) -> Result<(), ServiceError> {
        let path = self.path_for(name)?;
        let data = serde_json::to_vec_pretty(&items).map_err(ServiceError::storage)?;
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&tmp, data).await.map_err(ServiceError::storage)?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::storage(e));
        }
        debug!(collection = %name, count = items.len(), "collection_saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn json_file_store_persists_across_instances() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_file_store_{}", uuid::Uuid::new_v4()));
        let store = JsonFileStore::new(&tmp).await?;

        // 不存在的集合视为空
        assert!(store.get_collection("packages").await?.is_empty());

        store.save_collection("packages", vec![json!({"id": "p1", "name": "Gold"})]).await?;
        let reloaded = JsonFileStore::new(&tmp).await?;
        let items = reloaded.get_collection("packages").await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Gold");
        assert!(tmp.join("packages.json").exists());

        let _ = tokio::fs::remove_dir_all(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn rejects_bad_names_and_corrupt_files() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_file_store_{}", uuid::Uuid::new_v4()));
        let store = JsonFileStore::new(&tmp).await?;

        assert!(matches!(store.get_collection("../etc").await, Err(ServiceError::Validation(_))));
        assert!(matches!(store.save_collection("", vec![]).await, Err(ServiceError::Validation(_))));

        tokio::fs::write(tmp.join("bookings.json"), b"{not json").await?;
        assert!(matches!(store.get_collection("bookings").await, Err(ServiceError::Storage(_))));

        tokio::fs::write(tmp.join("users.json"), b"  \n").await?;
        assert!(store.get_collection("users").await?.is_empty());

        let _ = tokio::fs::remove_dir_all(&tmp).await;
        Ok(())
    }
}
