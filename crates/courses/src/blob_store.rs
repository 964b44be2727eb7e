//! Blob storage for uploaded course materials.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("invalid blob key: {0}")]
    InvalidKey(String),
    #[error("blob i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key for a course file blob: `courses/<course_id>/<file_id>`.
pub fn course_file_key(course_id: &str, file_id: &str) -> String {
    format!("courses/{course_id}/{file_id}")
}

pub fn course_prefix(course_id: &str) -> String {
    format!("courses/{course_id}")
}

pub trait BlobStore: Send + Sync {
    fn put(&self, key: &str, data: Bytes) -> impl Future<Output = Result<(), BlobError>> + Send;
    fn get(&self, key: &str) -> impl Future<Output = Result<Bytes, BlobError>> + Send;
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), BlobError>> + Send;
    /// Remove every blob under a prefix. A missing prefix is not an error.
    fn delete_prefix(&self, prefix: &str) -> impl Future<Output = Result<(), BlobError>> + Send;
}

/// Stores blobs as plain files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(key);
        // `components()` silently drops `.` and empty segments, so a key such
        // as `courses/.` would otherwise resolve to its parent directory.
        let segments = key.split('/').count();
        let safe = !key.is_empty()
            && relative.components().count() == segments
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        debug!(key, bytes = data.len(), "stored blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(key.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "deleted blob");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(key.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), BlobError> {
        let path = self.path_for(prefix)?;
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn put_get_delete_round() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let key = course_file_key("algebra", "1_notes.pdf");

        store.put(&key, Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Bytes::from_static(b"hello"));
        assert!(dir.path().join("courses/algebra/1_notes.pdf").exists());

        store.delete(&key).await.unwrap();
        assert!(matches!(store.get(&key).await, Err(BlobError::NotFound(_))));
        assert!(matches!(store.delete(&key).await, Err(BlobError::NotFound(_))));
    }

    #[tokio::test]
    async fn rejects_keys_escaping_the_root() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());

        for key in ["../outside", "/etc/passwd", "courses/../../x", "", "courses/.", "courses//x", "courses/./x"] {
            let err = store.put(key, Bytes::new()).await.unwrap_err();
            assert!(matches!(err, BlobError::InvalidKey(_)), "{key} should be rejected");
        }
    }

    #[tokio::test]
    async fn delete_prefix_removes_course_directory() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store
            .put(&course_file_key("algebra", "1_a.pdf"), Bytes::from_static(b"a"))
            .await
            .unwrap();

        store.delete_prefix(&course_prefix("algebra")).await.unwrap();
        store.delete_prefix(&course_prefix("algebra")).await.unwrap();
        assert!(!dir.path().join("courses/algebra").exists());
    }

    #[tokio::test]
    async fn delete_prefix_never_widens_to_the_parent() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store
            .put(&course_file_key("algebra", "1_a.pdf"), Bytes::from_static(b"a"))
            .await
            .unwrap();

        let err = store.delete_prefix(&course_prefix(".")).await.unwrap_err();
        assert!(matches!(err, BlobError::InvalidKey(_)));
        assert!(dir.path().join("courses/algebra/1_a.pdf").exists());
    }
}
