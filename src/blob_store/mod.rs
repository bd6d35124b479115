/// Blob Storage System
///
/// Stores post media under opaque object keys and publishes them for public
/// read. Supports multiple backend implementations (disk, S3).
///
/// Publishing is a separate step after the write: between `put` and
/// `publish` the object exists but is not publicly readable.

pub mod disk;
pub mod s3;
pub mod store;

pub use store::BlobStore;

use crate::error::ServiceResult;
use async_trait::async_trait;

/// Blob storage backend trait
///
/// Implementations handle the actual storage, publication and retrieval of
/// media objects.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Check that the target bucket exists and is accessible
    async fn check_bucket(&self) -> ServiceResult<()>;

    /// Write an object under `key`; it is not publicly readable yet
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> ServiceResult<()>;

    /// Grant public read on a written object
    async fn publish(&self, key: &str) -> ServiceResult<()>;

    /// Fetch the attributes of a published object and return its media link
    async fn media_link(&self, key: &str) -> ServiceResult<String>;

    /// Read a published object
    async fn get(&self, key: &str) -> ServiceResult<Option<Vec<u8>>>;
}
