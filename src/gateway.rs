/// Read-side query gateway
///
/// Translates radius and cluster searches into index queries and decodes the
/// matching documents into posts.
use crate::{
    error::{ServiceError, ServiceResult},
    index::{Distance, DocumentIndex, Query, DEFAULT_RADIUS},
    metrics,
    models::{Location, Post},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Geo-point field of the post document
pub const LOCATION_FIELD: &str = "location";

/// Face confidence field of the post document
pub const FACE_FIELD: &str = "face";

/// Minimum value for a post to belong to a cluster
pub const CLUSTER_THRESHOLD: f64 = 0.9;

#[derive(Clone)]
pub struct QueryGateway {
    index: Arc<dyn DocumentIndex>,
    collection: String,
}

impl QueryGateway {
    pub fn new(index: Arc<dyn DocumentIndex>, collection: &str) -> Self {
        Self {
            index,
            collection: collection.to_string(),
        }
    }

    /// Posts located within `radius` (default 200 km) of `center`
    pub async fn radius_search(
        &self,
        center: Location,
        radius: Option<Distance>,
    ) -> ServiceResult<Vec<Post>> {
        let radius = radius.unwrap_or(DEFAULT_RADIUS);
        debug!(lat = center.lat, lon = center.lon, "Radius search within {}", radius);
        let query = Query::geo_radius(LOCATION_FIELD, center, Some(radius));

        self.run("radius", &query).await
    }

    /// Posts whose `field` is at least the cluster threshold.
    ///
    /// The field name is not checked against the document shape.
    pub async fn cluster_search(&self, field: &str) -> ServiceResult<Vec<Post>> {
        debug!(field = %field, "Cluster search with threshold {}", CLUSTER_THRESHOLD);

        self.run("cluster", &Query::numeric_range(field, CLUSTER_THRESHOLD)).await
    }

    async fn run(&self, kind: &str, query: &Query) -> ServiceResult<Vec<Post>> {
        metrics::record_search(kind);
        let docs = self
            .index
            .query(&self.collection, query)
            .await
            .map_err(|e| match e {
                ServiceError::Index(_) => e,
                other => ServiceError::Index(other.to_string()),
            })?;

        let posts = decode_posts(docs);
        metrics::record_search_hits(kind, posts.len());
        Ok(posts)
    }
}

/// Decode search hits into posts, skipping documents that do not conform
pub fn decode_posts(docs: Vec<Value>) -> Vec<Post> {
    docs.into_iter()
        .filter_map(|doc| match serde_json::from_value::<Post>(doc) {
            Ok(post) => Some(post),
            Err(e) => {
                warn!("Skipping non-conforming document: {}", e);
                metrics::record_nonconforming_document();
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;
    use crate::media::MediaKind;
    use crate::test_support::FailingIndex;
    use serde_json::json;

    fn post_at(user: &str, lat: f64, lon: f64, face: f32) -> Post {
        Post {
            user: user.to_string(),
            message: format!("from {}", user),
            location: Location::new(lat, lon),
            url: format!("https://media.test/{}", user),
            media_type: Some(MediaKind::Image),
            face,
        }
    }

    async fn seeded(posts: &[Post]) -> (Arc<MemoryIndex>, QueryGateway) {
        let index = Arc::new(MemoryIndex::new(100));
        index.ensure_collection("post").await.unwrap();
        for (i, post) in posts.iter().enumerate() {
            let doc = serde_json::to_value(post).unwrap();
            index.upsert("post", &i.to_string(), &doc).await.unwrap();
        }
        let gateway = QueryGateway::new(index.clone(), "post");
        (index, gateway)
    }

    fn users(mut posts: Vec<Post>) -> Vec<String> {
        posts.sort_by(|a, b| a.user.cmp(&b.user));
        posts.into_iter().map(|p| p.user).collect()
    }

    #[tokio::test]
    async fn test_radius_search_default_range() {
        let (_, gateway) = seeded(&[
            post_at("center", 37.0, -122.0, 0.0),
            post_at("near", 38.0, -122.0, 0.0),  // ~111 km
            post_at("far", 41.5, -122.0, 0.0),   // ~500 km
        ])
        .await;

        let hits = gateway
            .radius_search(Location::new(37.0, -122.0), None)
            .await
            .unwrap();

        assert_eq!(users(hits), vec!["center", "near"]);
    }

    #[tokio::test]
    async fn test_radius_search_explicit_range() {
        let (_, gateway) = seeded(&[
            post_at("near", 38.0, -122.0, 0.0),
            post_at("far", 41.5, -122.0, 0.0),
        ])
        .await;

        let hits = gateway
            .radius_search(Location::new(37.0, -122.0), Some(Distance::kilometers(600.0)))
            .await
            .unwrap();
        assert_eq!(users(hits), vec!["far", "near"]);

        let hits = gateway
            .radius_search(Location::new(37.0, -122.0), Some(Distance::kilometers(50.0)))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_cluster_search_threshold() {
        let (_, gateway) = seeded(&[
            post_at("confident", 0.0, 0.0, 0.95),
            post_at("unsure", 0.0, 0.0, 0.5),
        ])
        .await;

        let hits = gateway.cluster_search(FACE_FIELD).await.unwrap();
        assert_eq!(users(hits), vec!["confident"]);
    }

    #[tokio::test]
    async fn test_written_post_round_trips() {
        let original = post_at("alice", 37.1, -122.1, 0.73);
        let (_, gateway) = seeded(std::slice::from_ref(&original)).await;

        let hits = gateway
            .radius_search(Location::new(37.0, -122.0), None)
            .await
            .unwrap();

        assert_eq!(hits, vec![original]);
    }

    #[tokio::test]
    async fn test_index_failure_surfaces_as_index_error() {
        let gateway = QueryGateway::new(Arc::new(FailingIndex), "post");
        let err = gateway.cluster_search(FACE_FIELD).await.unwrap_err();
        assert!(matches!(err, ServiceError::Index(_)));
    }

    #[test]
    fn test_decode_skips_nonconforming_documents() {
        let posts = decode_posts(vec![
            json!({"user": "ok", "location": {"lat": 1.0, "lon": 2.0}, "type": "video"}),
            json!({"user": "bad", "face": "not-a-number"}),
            json!("just a string"),
        ]);

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].user, "ok");
        assert_eq!(posts[0].media_type, Some(MediaKind::Video));
    }
}
