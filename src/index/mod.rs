/// Document index clients
///
/// Write path upserts JSON documents by id into a named collection; read path
/// runs a geo-radius or numeric-range query. Result order is whatever the
/// backend returns.
pub mod elasticsearch;
pub mod memory;
pub mod query;

pub use elasticsearch::{ElasticsearchConfig, ElasticsearchIndex};
pub use memory::MemoryIndex;
pub use query::{Distance, Query, DEFAULT_RADIUS};

use crate::{
    config::{IndexBackendConfig, IndexConfig},
    error::ServiceResult,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Create the collection with its mapping if it does not exist
    async fn ensure_collection(&self, collection: &str) -> ServiceResult<()>;

    /// Insert or replace the document stored under `id`
    async fn upsert(&self, collection: &str, id: &str, doc: &Value) -> ServiceResult<()>;

    /// Return the documents matching `query`
    async fn query(&self, collection: &str, query: &Query) -> ServiceResult<Vec<Value>>;

    /// Check the index is reachable
    async fn ping(&self) -> ServiceResult<()>;
}

/// Build the configured document index
pub fn from_config(config: &IndexConfig) -> ServiceResult<Arc<dyn DocumentIndex>> {
    match &config.backend {
        IndexBackendConfig::Elasticsearch {
            url,
            username,
            password,
        } => Ok(Arc::new(ElasticsearchIndex::new(ElasticsearchConfig {
            url: url.clone(),
            username: username.clone(),
            password: password.clone(),
            search_size: config.search_size,
            timeout_secs: 30,
        })?)),
        IndexBackendConfig::Memory => {
            tracing::warn!("Using in-memory index - posts are not persisted");
            Ok(Arc::new(MemoryIndex::new(config.search_size)))
        }
    }
}
