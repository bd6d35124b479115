/// In-process document index
///
/// Evaluates geo-radius and numeric-range queries directly over stored JSON
/// documents. Suitable for local development and tests; contents are lost on
/// restart.
use crate::{
    error::{ServiceError, ServiceResult},
    index::{DocumentIndex, Query},
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

type Collection = HashMap<String, Value>;

pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
    search_size: usize,
}

impl MemoryIndex {
    pub fn new(search_size: usize) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            search_size,
        }
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map(HashMap::len).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Fetch a document by id
    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .read()
            .ok()?
            .get(collection)?
            .get(id)
            .cloned()
    }
}

fn poisoned<T>(_: T) -> ServiceError {
    ServiceError::Index("In-memory index lock poisoned".to_string())
}

#[async_trait]
impl DocumentIndex for MemoryIndex {
    async fn ensure_collection(&self, collection: &str) -> ServiceResult<()> {
        self.collections
            .write()
            .map_err(poisoned)?
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn upsert(&self, collection: &str, id: &str, doc: &Value) -> ServiceResult<()> {
        self.collections
            .write()
            .map_err(poisoned)?
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> ServiceResult<Vec<Value>> {
        let collections = self.collections.read().map_err(poisoned)?;
        let docs = collections.get(collection).ok_or_else(|| {
            ServiceError::Index(format!("Collection '{}' does not exist", collection))
        })?;

        Ok(docs
            .values()
            .filter(|doc| query.matches(doc))
            .take(self.search_size)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> ServiceResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let index = MemoryIndex::new(10);
        index.upsert("post", "1", &json!({"face": 0.1})).await.unwrap();
        index.upsert("post", "1", &json!({"face": 0.95})).await.unwrap();

        assert_eq!(index.len("post"), 1);
        assert_eq!(index.get("post", "1"), Some(json!({"face": 0.95})));
    }

    #[tokio::test]
    async fn test_query_filters_documents() {
        let index = MemoryIndex::new(10);
        index.upsert("post", "a", &json!({"face": 0.95})).await.unwrap();
        index.upsert("post", "b", &json!({"face": 0.5})).await.unwrap();

        let hits = index
            .query("post", &Query::numeric_range("face", 0.9))
            .await
            .unwrap();
        assert_eq!(hits, vec![json!({"face": 0.95})]);
    }

    #[tokio::test]
    async fn test_query_respects_search_size() {
        let index = MemoryIndex::new(2);
        for i in 0..5 {
            let doc = json!({"location": {"lat": 1.0, "lon": 1.0}});
            index.upsert("post", &i.to_string(), &doc).await.unwrap();
        }

        let hits = index
            .query("post", &Query::geo_radius("location", Location::new(1.0, 1.0), None))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_query_unknown_collection_fails() {
        let index = MemoryIndex::new(10);
        let result = index.query("missing", &Query::numeric_range("face", 0.9)).await;
        assert!(matches!(result, Err(ServiceError::Index(_))));
    }
}
