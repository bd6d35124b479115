/// Application context and dependency injection
use crate::{
    annotation::{self, FaceDetector},
    auth::TokenVerifier,
    blob_store::BlobStore,
    config::ServerConfig,
    error::ServiceResult,
    gateway::QueryGateway,
    index::{self, DocumentIndex},
    pipeline::IngestionPipeline,
};
use std::sync::Arc;
use tracing::info;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub token_verifier: Arc<TokenVerifier>,
    pub blob_store: BlobStore,
    pub index: Arc<dyn DocumentIndex>,
    pub pipeline: IngestionPipeline,
    pub gateway: QueryGateway,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ServiceResult<Self> {
        config.validate()?;

        let blob_store =
            BlobStore::from_config(&config.storage.blobstore, &config.service.public_url).await?;
        let detector = annotation::from_config(&config.annotation)?;
        let index = index::from_config(&config.index)?;

        index.ensure_collection(&config.index.post_collection).await?;
        info!("Post collection '{}' ready", config.index.post_collection);

        Ok(Self::from_parts(config, blob_store, detector, index))
    }

    /// Assemble a context from already constructed clients
    pub fn from_parts(
        config: ServerConfig,
        blob_store: BlobStore,
        detector: Arc<dyn FaceDetector>,
        index: Arc<dyn DocumentIndex>,
    ) -> Self {
        let collection = config.index.post_collection.clone();
        let pipeline = IngestionPipeline::new(
            blob_store.clone(),
            detector,
            index.clone(),
            &collection,
            config.ingest.media_policy,
        );
        let gateway = QueryGateway::new(index.clone(), &collection);
        let token_verifier = Arc::new(TokenVerifier::new(&config.authentication.jwt_secret));

        Self {
            config: Arc::new(config),
            token_verifier,
            blob_store,
            index,
            pipeline,
            gateway,
        }
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_new_with_local_backends() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path().join("media"));

        let ctx = AppContext::new(config).await.unwrap();

        assert_eq!(ctx.service_url(), "http://127.0.0.1:8080");
        assert!(ctx.blob_store.check().await.is_ok());
        assert!(ctx.index.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path().join("media"));
        config.authentication.jwt_secret = "short".to_string();

        assert!(AppContext::new(config).await.is_err());
    }
}
