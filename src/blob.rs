// ABOUTME: Blob storage for uploaded payment proofs, behind a swappable async trait
// ABOUTME: FileBlobStore maps principal-namespaced keys onto a local directory

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid blob key: {0:?}")]
    InvalidKey(String),
}

/// Storage for uploaded files. Keys are path-like and always start with the
/// owning principal's id, e.g. `3f2c…/1735689600000.png`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob and return the reference to persist alongside the record.
    async fn upload(&self, key: &str, data: &[u8]) -> Result<String, BlobError>;

    /// Fetch a blob. `None` if nothing is stored under the reference.
    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>, BlobError>;

    /// Delete a single blob. No-op if missing.
    async fn delete(&self, reference: &str) -> Result<(), BlobError>;

    /// Fetchable location for a stored reference.
    fn public_url(&self, reference: &str) -> String;
}

pub struct FileBlobStore {
    base_dir: PathBuf,
    public_base_url: String,
}

impl FileBlobStore {
    pub async fn open(base_dir: &Path, public_base_url: &str) -> Result<Self, BlobError> {
        tokio::fs::create_dir_all(base_dir).await?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a key under base_dir. Only plain path segments are accepted, so a
    /// key can never escape the store.
    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        if key.is_empty() {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        let relative = Path::new(key);
        let all_normal = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !all_normal {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        Ok(self.base_dir.join(relative))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn upload(&self, key: &str, data: &[u8]) -> Result<String, BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(key.to_string())
    }

    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.resolve(reference)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, reference: &str) -> Result<(), BlobError> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn public_url(&self, reference: &str) -> String {
        format!("{}/payment-proofs/{}", self.public_base_url, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (FileBlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::open(dir.path(), "http://localhost:3000/")
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn upload_then_get_returns_same_bytes() {
        let (store, _dir) = store().await;

        let reference = store.upload("user-a/1.png", b"png-bytes").await.unwrap();
        assert_eq!(reference, "user-a/1.png");

        let data = store.get(&reference).await.unwrap();
        assert_eq!(data.as_deref(), Some(&b"png-bytes"[..]));
    }

    #[tokio::test]
    async fn missing_blob_is_none() {
        let (store, _dir) = store().await;
        assert!(store.get("nobody/0.png").await.unwrap().is_none());
        store.delete("nobody/0.png").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_keys_that_escape_the_store() {
        let (store, _dir) = store().await;

        for key in ["", "../etc/passwd", "/abs/path.png", "user/../../x.png"] {
            let result = store.upload(key, b"x").await;
            assert!(matches!(result, Err(BlobError::InvalidKey(_))), "key {key:?}");
        }
    }

    #[test]
    fn public_url_has_no_double_slash() {
        let store = FileBlobStore {
            base_dir: PathBuf::from("/tmp"),
            public_base_url: "http://localhost:3000".to_string(),
        };
        assert_eq!(
            store.public_url("u/1.png"),
            "http://localhost:3000/payment-proofs/u/1.png"
        );
    }
}
