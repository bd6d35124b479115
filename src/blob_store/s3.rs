/// S3-compatible blob storage backend
use crate::blob_store::BlobBackend;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::{debug, error, info};

/// S3 blob storage backend
///
/// Supports AWS S3 and S3-compatible storage providers (MinIO, DigitalOcean Spaces, etc.)
#[derive(Clone)]
pub struct S3BlobBackend {
    client: Arc<Client>,
    bucket: String,
    prefix: String,
    public_base_url: String,
}

/// Configuration for S3 storage
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,

    /// AWS region (e.g., "us-east-1")
    pub region: String,

    /// Custom endpoint for S3-compatible services (e.g., MinIO)
    /// Example: "http://localhost:9000"
    pub endpoint: Option<String>,

    /// AWS access key ID
    pub access_key_id: String,

    /// AWS secret access key
    pub secret_access_key: String,

    /// Path prefix for all objects (default: "media/")
    pub prefix: String,

    /// Base URL published objects are served from
    pub public_base_url: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: String::new(),
            secret_access_key: String::new(),
            prefix: "media/".to_string(),
            public_base_url: None,
        }
    }
}

impl S3Config {
    /// Base URL of the bucket as seen by public readers
    fn resolve_public_base_url(&self) -> String {
        if let Some(url) = &self.public_base_url {
            return url.trim_end_matches('/').to_string();
        }

        match &self.endpoint {
            // Path-style addressing for S3-compatible services
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

impl S3BlobBackend {
    /// Create a new S3 blob backend
    pub async fn new(config: S3Config) -> ServiceResult<Self> {
        info!(
            "Initializing S3 blob storage (bucket: {}, region: {})",
            config.bucket, config.region
        );

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None, // session token
            None, // expiration
            "geopost",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true); // Required for MinIO and some S3-compatible services
        }

        let client = Client::from_conf(s3_config_builder.build());
        let public_base_url = config.resolve_public_base_url();

        info!("✓ S3 blob storage initialized");

        Ok(Self {
            client: Arc::new(client),
            bucket: config.bucket,
            prefix: config.prefix,
            public_base_url,
        })
    }

    /// Get the S3 object key for a post id
    fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, self.object_key(key))
    }
}

#[async_trait]
impl BlobBackend for S3BlobBackend {
    async fn check_bucket(&self) -> ServiceResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                error!("S3 bucket {} not accessible: {}", self.bucket, e);
                ServiceError::BlobStorage(format!("S3 bucket not accessible: {}", e))
            })?;
        Ok(())
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> ServiceResult<()> {
        let object_key = self.object_key(key);

        debug!(
            "Uploading object to S3: {} ({} bytes, type: {})",
            object_key,
            data.len(),
            content_type
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload object to S3: {}", e);
                ServiceError::BlobStorage(format!("S3 upload failed: {}", e))
            })?;

        Ok(())
    }

    async fn publish(&self, key: &str) -> ServiceResult<()> {
        let object_key = self.object_key(key);

        self.client
            .put_object_acl()
            .bucket(&self.bucket)
            .key(&object_key)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to grant public read on {}: {}", object_key, e);
                ServiceError::BlobStorage(format!("S3 ACL grant failed: {}", e))
            })?;

        debug!("✓ Object published: {}", object_key);
        Ok(())
    }

    async fn media_link(&self, key: &str) -> ServiceResult<String> {
        let object_key = self.object_key(key);

        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to fetch attributes of {}: {}", object_key, e);
                ServiceError::BlobStorage(format!("S3 head object failed: {}", e))
            })?;

        Ok(self.object_url(key))
    }

    async fn get(&self, key: &str) -> ServiceResult<Option<Vec<u8>>> {
        let object_key = self.object_key(key);

        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(response) => {
                let data = response
                    .body
                    .collect()
                    .await
                    .map_err(|e| {
                        ServiceError::BlobStorage(format!("Failed to read S3 object: {}", e))
                    })?
                    .into_bytes()
                    .to_vec();
                Ok(Some(data))
            }
            Err(e) => {
                let error_msg = format!("{:?}", e);
                if error_msg.contains("NoSuchKey") || error_msg.contains("NotFound") {
                    Ok(None)
                } else {
                    error!("Failed to download object from S3: {}", e);
                    Err(ServiceError::BlobStorage(format!("S3 download failed: {}", e)))
                }
            }
        }
    }
}
