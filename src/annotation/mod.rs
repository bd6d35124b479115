/// Face annotation service clients
pub mod vision;

pub use vision::{VisionClient, VisionConfig};

use crate::{config::AnnotationConfig, error::ServiceResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Face detector trait
///
/// `Ok(None)` means the service ran and found no face; transport or service
/// failures are errors.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Confidence in [0.0, 1.0] of the first detected face in the blob at `uri`
    async fn detect_face(&self, uri: &str) -> ServiceResult<Option<f32>>;
}

/// Detector used when no annotation service is configured; never finds a face
pub struct DisabledDetector;

#[async_trait]
impl FaceDetector for DisabledDetector {
    async fn detect_face(&self, uri: &str) -> ServiceResult<Option<f32>> {
        tracing::debug!("Annotation disabled, skipping face detection for {}", uri);
        Ok(None)
    }
}

/// Build the configured face detector
pub fn from_config(config: &AnnotationConfig) -> ServiceResult<Arc<dyn FaceDetector>> {
    match config {
        AnnotationConfig::Vision { endpoint, api_key } => {
            let client = VisionClient::new(VisionConfig {
                endpoint: endpoint.clone(),
                api_key: api_key.clone(),
                ..Default::default()
            })?;
            Ok(Arc::new(client))
        }
        AnnotationConfig::None => {
            tracing::warn!("No annotation service configured - face scores will be 0");
            Ok(Arc::new(DisabledDetector))
        }
    }
}
