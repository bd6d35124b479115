/// Disk-based blob storage backend
use crate::{
    blob_store::BlobBackend,
    error::{ServiceError, ServiceResult},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

const STAGING_DIR: &str = ".staging";

/// Disk storage backend
///
/// Objects are written into a staging directory and published by moving them
/// into a sharded public tree: `{base}/{first2chars}/{key}`. Only published
/// objects are served.
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
    public_url: String,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf, public_url: &str) -> Self {
        Self {
            base_path,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Keys come from clients on the read path; only plain ids are accepted
    fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn staging_path(&self, key: &str) -> PathBuf {
        self.base_path.join(STAGING_DIR).join(key)
    }

    fn published_path(&self, key: &str) -> PathBuf {
        if key.len() >= 2 {
            self.base_path.join(&key[0..2]).join(key)
        } else {
            self.base_path.join("_").join(key)
        }
    }

    fn checked_key(key: &str) -> ServiceResult<&str> {
        if Self::is_valid_key(key) {
            Ok(key)
        } else {
            Err(ServiceError::BlobStorage(format!("Invalid object key '{}'", key)))
        }
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn check_bucket(&self) -> ServiceResult<()> {
        match fs::metadata(&self.base_path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ServiceError::BlobStorage(format!(
                "Blob location {:?} is not a directory",
                self.base_path
            ))),
            Err(e) => Err(ServiceError::BlobStorage(format!(
                "Blob location {:?} is not accessible: {}",
                self.base_path, e
            ))),
        }
    }

    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> ServiceResult<()> {
        let key = Self::checked_key(key)?;
        let path = self.staging_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ServiceError::BlobStorage(format!("Failed to create staging directory: {}", e))
            })?;
        }

        fs::write(&path, data).await.map_err(|e| {
            ServiceError::BlobStorage(format!("Failed to write object {}: {}", key, e))
        })?;

        Ok(())
    }

    async fn publish(&self, key: &str) -> ServiceResult<()> {
        let key = Self::checked_key(key)?;
        let target = self.published_path(key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ServiceError::BlobStorage(format!("Failed to create object directory: {}", e))
            })?;
        }

        fs::rename(self.staging_path(key), &target).await.map_err(|e| {
            ServiceError::BlobStorage(format!("Failed to publish object {}: {}", key, e))
        })?;

        Ok(())
    }

    async fn media_link(&self, key: &str) -> ServiceResult<String> {
        let key = Self::checked_key(key)?;
        fs::metadata(self.published_path(key)).await.map_err(|e| {
            ServiceError::BlobStorage(format!("Failed to read attributes of {}: {}", key, e))
        })?;

        Ok(format!("{}/media/{}", self.public_url, key))
    }

    async fn get(&self, key: &str) -> ServiceResult<Option<Vec<u8>>> {
        if !Self::is_valid_key(key) {
            return Ok(None);
        }

        match fs::read(self.published_path(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServiceError::BlobStorage(format!(
                "Failed to read object {}: {}",
                key, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_publish_and_get() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf(), "http://localhost:8080/");

        let key = "3f0c9a2e-1d4b-4c8e-9f7a-0123456789ab";
        let data = b"test media".to_vec();

        backend.check_bucket().await.unwrap();
        backend.put(key, data.clone(), "image/png").await.unwrap();
        backend.publish(key).await.unwrap();

        let link = backend.media_link(key).await.unwrap();
        assert_eq!(link, format!("http://localhost:8080/media/{}", key));
        assert_eq!(backend.get(key).await.unwrap(), Some(data));
    }

    #[tokio::test]
    async fn test_staged_object_is_not_served() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf(), "http://localhost");

        backend.put("staged01", b"x".to_vec(), "image/png").await.unwrap();

        assert_eq!(backend.get("staged01").await.unwrap(), None);
        assert!(backend.media_link("staged01").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_bucket_fails_check() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().join("missing"), "http://localhost");

        let err = backend.check_bucket().await.unwrap_err();
        assert!(matches!(err, ServiceError::BlobStorage(_)));
    }

    #[tokio::test]
    async fn test_publish_without_put_fails() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf(), "http://localhost");

        assert!(backend.publish("neverwritten").await.is_err());
    }

    #[tokio::test]
    async fn test_path_traversal_keys_rejected() {
        let dir = tempdir().unwrap();
        let backend = DiskBlobBackend::new(dir.path().to_path_buf(), "http://localhost");

        assert_eq!(backend.get("../etc/passwd").await.unwrap(), None);
        assert!(backend.put("../escape", b"x".to_vec(), "text/plain").await.is_err());
    }

    #[test]
    fn test_directory_sharding() {
        let backend = DiskBlobBackend::new(PathBuf::from("/data/media"), "http://localhost");
        let path = backend.published_path("abcdef");
        assert_eq!(path, PathBuf::from("/data/media/ab/abcdef"));
    }
}
