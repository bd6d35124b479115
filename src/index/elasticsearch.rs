/// Elasticsearch document index over the REST API
use crate::{
    error::{ServiceError, ServiceResult},
    index::{DocumentIndex, Query},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Elasticsearch connection settings
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub search_size: usize,
    pub timeout_secs: u64,
}

#[derive(Clone)]
pub struct ElasticsearchIndex {
    http_client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    search_size: usize,
}

impl ElasticsearchIndex {
    pub fn new(config: ElasticsearchConfig) -> ServiceResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::Config(format!("Failed to build Elasticsearch client: {}", e))
            })?;

        info!("Using Elasticsearch index at {}", config.url);

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
            search_size: config.search_size,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(username) => builder.basic_auth(username, self.password.as_deref()),
            None => builder,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    async fn send(&self, builder: RequestBuilder) -> ServiceResult<reqwest::Response> {
        self.authorized(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Index(format!("Elasticsearch request failed: {}", e)))
    }

    async fn fail(action: &str, response: reqwest::Response) -> ServiceError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        ServiceError::Index(format!("Elasticsearch {} returned {}: {}", action, status, text))
    }
}

/// Mapping for the post collection; `location` must be a geo-point for
/// geo-distance queries to match.
pub fn post_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "user": { "type": "keyword" },
                "message": { "type": "text" },
                "location": { "type": "geo_point" },
                "url": { "type": "keyword", "index": false },
                "type": { "type": "keyword" },
                "face": { "type": "float" }
            }
        }
    })
}

/// Search request body
pub fn search_body(query: &Query, size: usize) -> Value {
    json!({
        "size": size,
        "query": query.to_dsl()
    })
}

#[async_trait]
impl DocumentIndex for ElasticsearchIndex {
    async fn ensure_collection(&self, collection: &str) -> ServiceResult<()> {
        let url = self.collection_url(collection);
        let exists = self.send(self.http_client.head(&url)).await?;

        match exists.status() {
            s if s.is_success() => return Ok(()),
            StatusCode::NOT_FOUND => {}
            _ => return Err(Self::fail("index exists check", exists).await),
        }

        let response = self
            .send(self.http_client.put(&url).json(&post_mapping()))
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail("index create", response).await);
        }

        info!("Created index '{}'", collection);
        Ok(())
    }

    async fn upsert(&self, collection: &str, id: &str, doc: &Value) -> ServiceResult<()> {
        let url = format!("{}/_doc/{}", self.collection_url(collection), id);
        let response = self.send(self.http_client.put(&url).json(doc)).await?;

        if !response.status().is_success() {
            return Err(Self::fail("index", response).await);
        }

        debug!("Indexed document {} into '{}'", id, collection);
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> ServiceResult<Vec<Value>> {
        let url = format!("{}/_search", self.collection_url(collection));
        let body = search_body(query, self.search_size);
        let response = self.send(self.http_client.post(&url).json(&body)).await?;

        if !response.status().is_success() {
            return Err(Self::fail("search", response).await);
        }

        let search_response: SearchResponse = response.json().await.map_err(|e| {
            ServiceError::Index(format!("Failed to parse search response: {}", e))
        })?;

        Ok(search_response.into_sources())
    }

    async fn ping(&self) -> ServiceResult<()> {
        let response = self.send(self.http_client.get(&self.base_url)).await?;
        if !response.status().is_success() {
            return Err(Self::fail("ping", response).await);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: InnerHits,
}

#[derive(Debug, Deserialize)]
struct InnerHits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Option<Value>,
}

impl SearchResponse {
    fn into_sources(self) -> Vec<Value> {
        self.hits
            .hits
            .into_iter()
            .filter_map(|hit| hit.source)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    #[test]
    fn test_search_body_shape() {
        let query = Query::geo_radius("location", Location::new(37.0, -122.0), None);
        assert_eq!(
            search_body(&query, 100),
            json!({
                "size": 100,
                "query": {
                    "geo_distance": {
                        "distance": "200km",
                        "location": {"lat": 37.0, "lon": -122.0}
                    }
                }
            })
        );
    }

    #[test]
    fn test_mapping_declares_geo_point() {
        let mapping = post_mapping();
        assert_eq!(mapping["mappings"]["properties"]["location"]["type"], "geo_point");
        assert_eq!(mapping["mappings"]["properties"]["face"]["type"], "float");
    }

    #[test]
    fn test_hits_without_source_are_skipped() {
        let response: SearchResponse = serde_json::from_value(json!({
            "took": 3,
            "hits": {
                "total": {"value": 2},
                "hits": [
                    {"_id": "a", "_source": {"user": "alice"}},
                    {"_id": "b"}
                ]
            }
        }))
        .unwrap();

        assert_eq!(response.into_sources(), vec![json!({"user": "alice"})]);
    }

    #[test]
    fn test_base_url_normalized() {
        let index = ElasticsearchIndex::new(ElasticsearchConfig {
            url: "http://localhost:9200/".to_string(),
            username: None,
            password: None,
            search_size: 10,
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(index.collection_url("post"), "http://localhost:9200/post");
    }
}
