/// Google Cloud Vision face detection client
///
/// Calls the `images:annotate` REST endpoint with a single `FACE_DETECTION`
/// feature and reads the first face's detection confidence.
use crate::{
    annotation::FaceDetector,
    error::{ServiceError, ServiceResult},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Vision client configuration
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Vision API client
pub struct VisionClient {
    http_client: Client,
    config: VisionConfig,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> ServiceResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Config(format!("Failed to build Vision client: {}", e)))?;

        info!("Vision face detection enabled ({})", config.endpoint);

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl FaceDetector for VisionClient {
    async fn detect_face(&self, uri: &str) -> ServiceResult<Option<f32>> {
        let body = json!({
            "requests": [{
                "image": { "source": { "imageUri": uri } },
                "features": [{ "type": "FACE_DETECTION", "maxResults": 1 }]
            }]
        });

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Annotation(format!("Vision request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Annotation(format!(
                "Vision returned {}: {}",
                status, text
            )));
        }

        let parsed: AnnotateResponse = response.json().await.map_err(|e| {
            ServiceError::Annotation(format!("Failed to parse Vision response: {}", e))
        })?;

        let score = first_face_confidence(parsed)?;
        match score {
            Some(score) => debug!("Face detected in {} with confidence {}", uri, score),
            None => debug!("No faces found in {}", uri),
        }
        Ok(score)
    }
}

/// Extract the first face's confidence; zero faces is `None`, a per-image
/// error reported by the service is an error.
fn first_face_confidence(response: AnnotateResponse) -> ServiceResult<Option<f32>> {
    let image = response
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::Annotation("Vision returned no responses".to_string()))?;

    if let Some(status) = image.error {
        return Err(ServiceError::Annotation(format!(
            "Vision error {}: {}",
            status.code, status.message
        )));
    }

    Ok(image
        .face_annotations
        .first()
        .map(|face| face.detection_confidence.clamp(0.0, 1.0)))
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    face_annotations: Vec<FaceAnnotation>,
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceAnnotation {
    #[serde(default)]
    detection_confidence: f32,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}
