//! Local filesystem document storage

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores uploaded documents and hands back opaque location handles.
/// Handles are what gets persisted in attachment rows; callers never
/// construct paths themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `content` under the given namespace, returning the handle.
    async fn store(&self, namespace: &str, file_name: &str, content: &[u8]) -> Result<String>;
    /// Read back the bytes behind a handle returned by `store`.
    async fn retrieve(&self, handle: &str) -> Result<Vec<u8>>;
    /// Remove every file stored under the namespace.
    async fn remove_namespace(&self, namespace: &str) -> Result<()>;
}

pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Extension taken from the client file name, restricted to a safe charset.
fn safe_extension(file_name: &str) -> Option<&str> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if !ext.is_empty()
        && ext.len() <= 10
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        Some(ext)
    } else {
        None
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, namespace: &str, file_name: &str, content: &[u8]) -> Result<String> {
        let stored_name = match safe_extension(file_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
            None => Uuid::new_v4().to_string(),
        };

        let dir = self.root.join(namespace);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("create {}: {}", dir.display(), e)))?;

        let path = dir.join(&stored_name);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {}", path.display(), e)))?;

        Ok(format!("{}/{}", namespace, stored_name))
    }

    async fn retrieve(&self, handle: &str) -> Result<Vec<u8>> {
        // Handles are produced by store(); anything path-shaped beyond
        // "namespace/filename" is rejected outright
        if handle.starts_with('/') || handle.split('/').any(|part| part.is_empty() || part == "..")
        {
            return Err(AppError::Storage(format!("Invalid handle: {}", handle)));
        }

        let path = self.root.join(handle);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                "Stored document not found".to_string(),
            )),
            Err(e) => Err(AppError::Storage(format!(
                "read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn remove_namespace(&self, namespace: &str) -> Result<()> {
        let dir = self.root.join(namespace);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "remove {}: {}",
                dir.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_extension() {
        assert_eq!(safe_extension("passport.pdf"), Some("pdf"));
        assert_eq!(safe_extension("scan.final.JPG"), Some("JPG"));
        assert_eq!(safe_extension("noext"), None);
        assert_eq!(safe_extension("weird.p/df"), None);
    }

    #[tokio::test]
    async fn test_store_and_remove_roundtrip() {
        let root = std::env::temp_dir().join(format!("docstore-{}", Uuid::new_v4()));
        let storage = LocalFileStorage::new(&root);

        let handle = storage
            .store("abc-namespace", "nid.pdf", b"content")
            .await
            .unwrap();
        assert!(handle.starts_with("abc-namespace/"));
        assert!(handle.ends_with(".pdf"));

        let on_disk = root.join(&handle);
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"content");
        assert_eq!(storage.retrieve(&handle).await.unwrap(), b"content");

        storage.remove_namespace("abc-namespace").await.unwrap();
        assert!(!on_disk.exists());

        // Removing again is a no-op
        storage.remove_namespace("abc-namespace").await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_retrieve_rejects_traversal_handles() {
        let storage = LocalFileStorage::new(std::env::temp_dir());
        assert!(matches!(
            storage.retrieve("../etc/passwd").await,
            Err(AppError::Storage(_))
        ));
        assert!(matches!(
            storage.retrieve("/etc/passwd").await,
            Err(AppError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_retrieve_missing_handle_is_not_found() {
        let storage = LocalFileStorage::new(std::env::temp_dir());
        assert!(matches!(
            storage.retrieve("no-such-namespace/no-such-file.pdf").await,
            Err(AppError::NotFound(_))
        ));
    }
}
