use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use rand::Rng;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::params::CacheKey;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Artifact not found: {0}")]
    NotFound(CacheKey),

    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Generated images on disk, one file per cache key.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    extension: Option<String>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, extension: Option<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.filter(|ext| !ext.is_empty()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the cache root if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        match &self.extension {
            Some(ext) => self.root.join(format!("{}.{}", key, ext)),
            None => self.root.join(key.as_str()),
        }
    }

    pub async fn exists(&self, key: &CacheKey) -> bool {
        fs::metadata(self.path_for(key))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    pub async fn read(&self, key: &CacheKey) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(key.clone())),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Write an artifact so readers never observe a partial file.
    ///
    /// The bytes land in a uniquely named temporary file next to the target
    /// and are renamed into place once flushed.
    pub async fn write(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = self
            .root
            .join(format!(".{}.{:016x}.tmp", key, rand::thread_rng().gen::<u64>()));

        if let Err(e) = write_file(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::io(&tmp, e));
        }

        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::io(&path, e));
        }

        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
