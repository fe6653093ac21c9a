//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the data directory used by the collection store exists.
pub async fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    if data_dir.trim().is_empty() {
        return Err(anyhow::anyhow!("data directory must not be empty"));
    }
    match tokio::fs::metadata(data_dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(anyhow::anyhow!("{data_dir} exists but is not a directory")),
        Err(_) => {
            warn!(%data_dir, "data directory not found; creating it");
            tokio::fs::create_dir_all(Path::new(data_dir))
                .await
                .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
            info!(%data_dir, event = "data_dir_created", "data directory ready");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_dir_and_rejects_files() -> anyhow::Result<()> {
        let base = std::env::temp_dir().join(format!("common_env_{}", std::process::id()));
        let dir = base.join("nested");
        let dir_str = dir.to_string_lossy().to_string();
        ensure_data_dir(&dir_str).await?;
        assert!(tokio::fs::metadata(&dir).await?.is_dir());
        // 再次调用应当幂等
        ensure_data_dir(&dir_str).await?;

        let file = base.join("plain.txt");
        tokio::fs::write(&file, b"x").await?;
        assert!(ensure_data_dir(&file.to_string_lossy()).await.is_err());
        assert!(ensure_data_dir("  ").await.is_err());

        let _ = tokio::fs::remove_dir_all(&base).await;
        Ok(())
    }
}
