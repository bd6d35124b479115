/// Blob Store Manager
///
/// Runs the upload contract against a backend: bucket check, write,
/// public-read grant, attribute fetch.
use crate::{
    blob_store::{
        disk::DiskBlobBackend,
        s3::{S3BlobBackend, S3Config},
        BlobBackend,
    },
    config::BlobstoreConfig,
    error::{ServiceError, ServiceResult},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Main blob store manager
#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn BlobBackend>,
}

impl BlobStore {
    pub fn new(backend: Arc<dyn BlobBackend>) -> Self {
        Self { backend }
    }

    /// Create a blob store from configuration
    pub async fn from_config(config: &BlobstoreConfig, public_url: &str) -> ServiceResult<Self> {
        let backend: Arc<dyn BlobBackend> = match config {
            BlobstoreConfig::Disk { location } => {
                tokio::fs::create_dir_all(location).await.map_err(|e| {
                    ServiceError::BlobStorage(format!(
                        "Failed to create blob directory {:?}: {}",
                        location, e
                    ))
                })?;
                info!("Using disk blob storage at {:?}", location);
                Arc::new(DiskBlobBackend::new(location.clone(), public_url))
            }
            BlobstoreConfig::S3 {
                bucket,
                region,
                access_key_id,
                secret_access_key,
                endpoint,
                public_base_url,
            } => {
                let s3_config = S3Config {
                    bucket: bucket.clone(),
                    region: region.clone(),
                    endpoint: endpoint.clone(),
                    access_key_id: access_key_id.clone(),
                    secret_access_key: secret_access_key.clone(),
                    public_base_url: public_base_url.clone(),
                    ..Default::default()
                };
                Arc::new(S3BlobBackend::new(s3_config).await?)
            }
        };

        Ok(Self::new(backend))
    }

    /// Upload media under `key` and return its public media link.
    ///
    /// Any failing step fails the whole upload. A written but unpublished
    /// object may remain in the store; callers must not reference `key` after
    /// an error.
    pub async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> ServiceResult<String> {
        let size = data.len();

        self.backend.check_bucket().await.map_err(as_storage_error)?;
        self.backend
            .put(key, data, content_type)
            .await
            .map_err(as_storage_error)?;

        // Object exists but is not publicly readable until this returns
        if let Err(e) = self.backend.publish(key).await {
            warn!(key = %key, "Object written but not published: {}", e);
            return Err(as_storage_error(e));
        }

        let link = self.backend.media_link(key).await.map_err(as_storage_error)?;

        debug!(key = %key, size, "Media saved to blob store: {}", link);
        Ok(link)
    }

    /// Get a published object
    pub async fn get(&self, key: &str) -> ServiceResult<Option<Vec<u8>>> {
        self.backend.get(key).await
    }

    /// Check the bucket is reachable
    pub async fn check(&self) -> ServiceResult<()> {
        self.backend.check_bucket().await
    }
}

fn as_storage_error(e: ServiceError) -> ServiceError {
    match e {
        ServiceError::BlobStorage(_) => e,
        other => ServiceError::BlobStorage(other.to_string()),
    }
}
