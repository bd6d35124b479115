/// Configuration management for the geopost service
use crate::error::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub authentication: AuthConfig,
    pub storage: StorageConfig,
    pub annotation: AnnotationConfig,
    pub index: IndexConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Externally reachable base URL, used for disk-backed media links
    pub public_url: String,
    pub upload_limit_bytes: usize,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub blobstore: BlobstoreConfig,
}

/// Blob storage backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlobstoreConfig {
    Disk {
        location: PathBuf,
    },
    S3 {
        bucket: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
        endpoint: Option<String>,
        /// Base URL objects are publicly served from (defaults to the AWS virtual-host URL)
        public_base_url: Option<String>,
    },
}

/// Annotation service selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnnotationConfig {
    Vision { endpoint: String, api_key: String },
    None,
}

/// Document index selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub backend: IndexBackendConfig,
    pub post_collection: String,
    pub search_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IndexBackendConfig {
    Elasticsearch {
        url: String,
        username: Option<String>,
        password: Option<String>,
    },
    Memory,
}

/// Whether a submission must carry a media attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPolicy {
    Required,
    Optional,
}

impl std::str::FromStr for MediaPolicy {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(MediaPolicy::Required),
            "optional" => Ok(MediaPolicy::Optional),
            other => Err(ServiceError::Config(format!("Invalid media policy '{}'", other))),
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub media_policy: MediaPolicy,
}

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "geopost=debug,tower_http=debug";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    pub json: bool,
}

impl LoggingConfig {
    /// Build the tracing filter; invalid directives fall back to `info`
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|e| {
            eprintln!("Invalid log filter '{}': {}, using info", self.level, e);
            EnvFilter::new("info")
        })
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ServiceResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("GEOPOST_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("GEOPOST_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ServiceError::Config("Invalid port number".to_string()))?;
        let public_url = env::var("GEOPOST_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));
        let upload_limit_bytes = env::var("GEOPOST_UPLOAD_LIMIT_BYTES")
            .unwrap_or_else(|_| "10485760".to_string())
            .parse()
            .unwrap_or(10 * 1024 * 1024);

        let jwt_secret = env::var("GEOPOST_JWT_SECRET")
            .map_err(|_| ServiceError::Config("JWT secret required".to_string()))?;

        let blobstore = if let Ok(bucket) = env::var("GEOPOST_BLOBSTORE_S3_BUCKET") {
            BlobstoreConfig::S3 {
                bucket,
                region: env::var("GEOPOST_BLOBSTORE_S3_REGION")
                    .unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: env::var("GEOPOST_BLOBSTORE_S3_ACCESS_KEY_ID")
                    .map_err(|_| ServiceError::Config("S3 access key required".to_string()))?,
                secret_access_key: env::var("GEOPOST_BLOBSTORE_S3_SECRET_ACCESS_KEY")
                    .map_err(|_| ServiceError::Config("S3 secret key required".to_string()))?,
                endpoint: env::var("GEOPOST_BLOBSTORE_S3_ENDPOINT").ok(),
                public_base_url: env::var("GEOPOST_BLOBSTORE_S3_PUBLIC_URL").ok(),
            }
        } else {
            BlobstoreConfig::Disk {
                location: env::var("GEOPOST_BLOBSTORE_DISK_LOCATION")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./data/media")),
            }
        };

        let annotation = match env::var("GEOPOST_VISION_API_KEY") {
            Ok(api_key) => AnnotationConfig::Vision {
                endpoint: env::var("GEOPOST_VISION_ENDPOINT").unwrap_or_else(|_| {
                    "https://vision.googleapis.com/v1/images:annotate".to_string()
                }),
                api_key,
            },
            Err(_) => AnnotationConfig::None,
        };

        let index_backend = match env::var("GEOPOST_ELASTICSEARCH_URL") {
            Ok(url) => IndexBackendConfig::Elasticsearch {
                url,
                username: env::var("GEOPOST_ELASTICSEARCH_USERNAME").ok(),
                password: env::var("GEOPOST_ELASTICSEARCH_PASSWORD").ok(),
            },
            Err(_) => IndexBackendConfig::Memory,
        };
        let post_collection =
            env::var("GEOPOST_POST_COLLECTION").unwrap_or_else(|_| "post".to_string());
        let search_size = env::var("GEOPOST_INDEX_SEARCH_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| ServiceError::Config("Invalid index search size".to_string()))?;

        let media_policy = env::var("GEOPOST_MEDIA_POLICY")
            .unwrap_or_else(|_| "required".to_string())
            .parse()?;

        let log_level = env::var("RUST_LOG")
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        let log_json = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
                upload_limit_bytes,
            },
            authentication: AuthConfig { jwt_secret },
            storage: StorageConfig { blobstore },
            annotation,
            index: IndexConfig {
                backend: index_backend,
                post_collection,
                search_size,
            },
            ingest: IngestConfig { media_policy },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ServiceResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ServiceError::Config("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(ServiceError::Config(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if let BlobstoreConfig::S3 { bucket, .. } = &self.storage.blobstore {
            if bucket.is_empty() {
                return Err(ServiceError::Config("S3 bucket cannot be empty".to_string()));
            }
        }

        if self.index.post_collection.is_empty() {
            return Err(ServiceError::Config(
                "Post collection cannot be empty".to_string(),
            ));
        }

        if self.index.search_size == 0 {
            return Err(ServiceError::Config(
                "Index search size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config(location: PathBuf) -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            upload_limit_bytes: 1024 * 1024,
        },
        authentication: AuthConfig {
            jwt_secret: crate::test_support::TEST_JWT_SECRET.to_string(),
        },
        storage: StorageConfig {
            blobstore: BlobstoreConfig::Disk { location },
        },
        annotation: AnnotationConfig::None,
        index: IndexConfig {
            backend: IndexBackendConfig::Memory,
            post_collection: "post".to_string(),
            search_size: 100,
        },
        ingest: IngestConfig {
            media_policy: MediaPolicy::Required,
        },
        logging: LoggingConfig {
            level: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        },
    }
}
