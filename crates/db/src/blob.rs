//! Keyed document storage for booking copies.
//!
//! Keys are slash-separated relative paths such as `flight/<id>.json`.
//!
//! ```text
//! root_dir/
//! └── flight/
//!     ├── 0b7c...e1.json
//!     └── 5f21...9a.json
//! ```

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("invalid blob key `{0}`")]
    InvalidKey(String),
    #[error("blob io error at `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), BlobStoreError>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError>;
}

fn validate_key(key: &str) -> Result<(), BlobStoreError> {
    let path = Path::new(key);
    let relative = !key.is_empty()
        && !key.starts_with('/')
        && path.components().all(|component| matches!(component, Component::Normal(_)));
    if relative {
        Ok(())
    } else {
        Err(BlobStoreError::InvalidKey(key.to_owned()))
    }
}

/// Blob store backed by files under a root directory.
pub struct FsBlobStore {
    root_dir: PathBuf,
}

impl FsBlobStore {
    /// Creates the store, creating `root_dir` if it is missing.
    pub async fn new(root_dir: impl AsRef<Path>) -> Result<Self, BlobStoreError> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir)
            .await
            .map_err(|source| BlobStoreError::Io { path: root_dir.clone(), source })?;
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        validate_key(key)?;
        Ok(self.root_dir.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), BlobStoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| BlobStoreError::Io { path: parent.to_path_buf(), source })?;
        }

        fs::write(&path, body).await.map_err(|source| BlobStoreError::Io { path, source })
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BlobStoreError::Io { path, source }),
        }
    }
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), BlobStoreError> {
        validate_key(key)?;
        self.blobs.write().await.insert(key.to_owned(), body.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError> {
        validate_key(key)?;
        Ok(self.blobs.read().await.get(key).cloned())
    }
}
