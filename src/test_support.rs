/// Test doubles for the blob store, annotation service and index
use crate::{
    annotation::FaceDetector,
    blob_store::BlobBackend,
    error::{ServiceError, ServiceResult},
    index::{DocumentIndex, Query},
};
use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::mem::discriminant;
use std::sync::Mutex;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-characters";

/// Upload step seen by the fake backend
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStep {
    CheckBucket,
    Put(String),
    Publish(String),
    MediaLink(String),
}

/// In-memory blob backend that records every step and can fail at one of them
#[derive(Default)]
pub struct FakeBlobBackend {
    fail_at: Option<UploadStep>,
    steps: Mutex<Vec<UploadStep>>,
    objects: Mutex<HashMap<String, (Vec<u8>, bool)>>,
    published_order: Mutex<Vec<String>>,
}

impl FakeBlobBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail whenever a step of the same kind as `step` runs
    pub fn failing_at(step: UploadStep) -> Self {
        Self {
            fail_at: Some(step),
            ..Default::default()
        }
    }

    pub fn steps(&self) -> Vec<UploadStep> {
        self.steps.lock().unwrap().clone()
    }

    pub fn stored(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn published(&self, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, public)| *public)
            .unwrap_or(false)
    }

    pub fn published_keys(&self) -> Vec<String> {
        self.published_order.lock().unwrap().clone()
    }

    fn step(&self, step: UploadStep) -> ServiceResult<()> {
        let fails = self
            .fail_at
            .as_ref()
            .map(|f| discriminant(f) == discriminant(&step))
            .unwrap_or(false);
        self.steps.lock().unwrap().push(step.clone());
        if fails {
            Err(ServiceError::BlobStorage(format!("injected failure at {:?}", step)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlobBackend for FakeBlobBackend {
    async fn check_bucket(&self) -> ServiceResult<()> {
        self.step(UploadStep::CheckBucket)
    }

    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> ServiceResult<()> {
        self.step(UploadStep::Put(key.to_string()))?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, false));
        Ok(())
    }

    async fn publish(&self, key: &str) -> ServiceResult<()> {
        self.step(UploadStep::Publish(key.to_string()))?;
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| ServiceError::BlobStorage(format!("no object {}", key)))?;
        object.1 = true;
        self.published_order.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn media_link(&self, key: &str) -> ServiceResult<String> {
        self.step(UploadStep::MediaLink(key.to_string()))?;
        Ok(format!("https://media.test/{}", key))
    }

    async fn get(&self, key: &str) -> ServiceResult<Option<Vec<u8>>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .filter(|(_, public)| *public)
            .map(|(data, _)| data.clone()))
    }
}

/// Face detector returning a fixed outcome and recording the URIs it saw
pub struct FakeDetector {
    outcome: Result<Option<f32>, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeDetector {
    pub fn face(confidence: f32) -> Self {
        Self::with(Ok(Some(confidence)))
    }

    pub fn no_face() -> Self {
        Self::with(Ok(None))
    }

    pub fn failing() -> Self {
        Self::with(Err("vision unavailable".to_string()))
    }

    fn with(outcome: Result<Option<f32>, String>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FaceDetector for FakeDetector {
    async fn detect_face(&self, uri: &str) -> ServiceResult<Option<f32>> {
        self.calls.lock().unwrap().push(uri.to_string());
        self.outcome.clone().map_err(ServiceError::Annotation)
    }
}

/// Index whose every operation fails
pub struct FailingIndex;

#[async_trait]
impl DocumentIndex for FailingIndex {
    async fn ensure_collection(&self, _collection: &str) -> ServiceResult<()> {
        Err(ServiceError::Index("index unavailable".to_string()))
    }

    async fn upsert(&self, _collection: &str, _id: &str, _doc: &Value) -> ServiceResult<()> {
        Err(ServiceError::Index("index unavailable".to_string()))
    }

    async fn query(&self, _collection: &str, _query: &Query) -> ServiceResult<Vec<Value>> {
        Err(ServiceError::Index("index unavailable".to_string()))
    }

    async fn ping(&self) -> ServiceResult<()> {
        Err(ServiceError::Index("index unavailable".to_string()))
    }
}

/// Sign an HS256 bearer token carrying a `username` claim
pub fn token_for(username: &str) -> String {
    let claims = json!({
        "username": username,
        "exp": 4_102_444_800u64 // 2100-01-01
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
