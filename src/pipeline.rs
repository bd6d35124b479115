/// Post ingestion pipeline
///
/// Turns an authenticated submission into an indexed post. Stages run
/// strictly in order and stop at the first failure:
/// media check, id generation, classification, upload, annotation (images
/// only), index write. Nothing is retried and nothing written by an earlier
/// stage is removed when a later stage fails, so a failed index write can
/// leave a published blob with no post referencing it.
use crate::{
    annotation::FaceDetector,
    blob_store::BlobStore,
    config::MediaPolicy,
    error::{ServiceError, ServiceResult},
    index::DocumentIndex,
    media::{self, MediaKind},
    metrics,
    models::{Location, Post},
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// An uploaded file attached to a submission
#[derive(Debug, Clone)]
pub struct MediaAttachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A post submission with the submitter already authenticated
#[derive(Debug, Clone)]
pub struct Submission {
    pub user: String,
    pub message: String,
    pub location: Location,
    pub media: Option<MediaAttachment>,
}

/// Result of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestedPost {
    pub id: String,
    pub post: Post,
}

#[derive(Clone)]
pub struct IngestionPipeline {
    blob_store: BlobStore,
    detector: Arc<dyn FaceDetector>,
    index: Arc<dyn DocumentIndex>,
    collection: String,
    media_policy: MediaPolicy,
}

impl IngestionPipeline {
    pub fn new(
        blob_store: BlobStore,
        detector: Arc<dyn FaceDetector>,
        index: Arc<dyn DocumentIndex>,
        collection: &str,
        media_policy: MediaPolicy,
    ) -> Self {
        Self {
            blob_store,
            detector,
            index,
            collection: collection.to_string(),
            media_policy,
        }
    }

    /// Run a submission through every stage and index the resulting post
    pub async fn ingest(&self, submission: Submission) -> ServiceResult<IngestedPost> {
        let Submission {
            user,
            message,
            location,
            media,
        } = submission;

        if media.is_none() && self.media_policy == MediaPolicy::Required {
            metrics::record_ingest_failure("media");
            return Err(ServiceError::MediaRequired);
        }

        let id = Uuid::new_v4().to_string();
        let mut post = Post {
            user,
            message,
            location,
            ..Default::default()
        };

        if let Some(attachment) = media {
            let kind = media::classify(&attachment.file_name);
            post.media_type = Some(kind);
            debug!(post_id = %id, file = %attachment.file_name, "Classified media as {}", kind.as_str());

            post.url = self.upload(&id, kind, attachment).await?;

            if kind == MediaKind::Image {
                post.face = self.annotate(&id, &post.url).await?;
            }
        }

        self.write(&id, &post).await?;

        metrics::record_post_ingested(post.media_type.map(MediaKind::as_str).unwrap_or("none"));
        info!(post_id = %id, user = %post.user, "Post saved to index");

        Ok(IngestedPost { id, post })
    }

    async fn upload(&self, id: &str, kind: MediaKind, attachment: MediaAttachment) -> ServiceResult<String> {
        let content_type = attachment
            .content_type
            .unwrap_or_else(|| media::default_content_type(kind).to_string());

        self.blob_store
            .upload(id, attachment.data, &content_type)
            .await
            .map_err(|e| {
                error!(post_id = %id, "Failed to save media to blob store: {}", e);
                metrics::record_ingest_failure("upload");
                e
            })
    }

    async fn annotate(&self, id: &str, uri: &str) -> ServiceResult<f32> {
        match self.detector.detect_face(uri).await {
            Ok(Some(score)) => {
                metrics::record_annotation("face");
                Ok(score)
            }
            Ok(None) => {
                metrics::record_annotation("no_face");
                debug!(post_id = %id, "No faces found");
                Ok(0.0)
            }
            Err(e) => {
                metrics::record_annotation("error");
                metrics::record_ingest_failure("annotate");
                warn!(post_id = %id, "Media {} is published but the post will not be indexed", uri);
                error!(post_id = %id, "Failed to annotate image: {}", e);
                Err(match e {
                    ServiceError::Annotation(_) => e,
                    other => ServiceError::Annotation(other.to_string()),
                })
            }
        }
    }

    async fn write(&self, id: &str, post: &Post) -> ServiceResult<()> {
        let doc = serde_json::to_value(post)
            .map_err(|e| ServiceError::Internal(format!("Failed to encode post: {}", e)))?;

        self.index
            .upsert(&self.collection, id, &doc)
            .await
            .map_err(|e| {
                metrics::record_ingest_failure("index");
                if !post.url.is_empty() {
                    warn!(post_id = %id, "Media {} is published but has no post", post.url);
                }
                error!(post_id = %id, "Failed to save post to index: {}", e);
                match e {
                    ServiceError::Index(_) => e,
                    other => ServiceError::Index(other.to_string()),
                }
            })
    }
}
