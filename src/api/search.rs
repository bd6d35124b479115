/// Radius and cluster search endpoints
use crate::{
    api::params,
    auth::AuthContext,
    context::AppContext,
    error::ServiceResult,
    gateway::FACE_FIELD,
    models::{Location, Post},
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Build search routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/v1/search", get(search_posts))
        .route("/api/v1/cluster", get(cluster_posts))
}

/// Raw radius search parameters, parsed leniently
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClusterParams {
    pub term: Option<String>,
}

/// Posts within `range` km (default 200) of `lat`/`lon`
async fn search_posts(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    Query(params): Query<SearchParams>,
) -> ServiceResult<Json<Vec<Post>>> {
    let center = Location::new(
        params::parse_latitude(params.lat.as_deref()),
        params::parse_longitude(params.lon.as_deref()),
    );
    let radius = params::parse_range_km(params.range.as_deref());

    let posts = ctx.gateway.radius_search(center, radius).await?;
    Ok(Json(posts))
}

/// Posts whose `term` field (default `face`) meets the cluster threshold
async fn cluster_posts(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    Query(params): Query<ClusterParams>,
) -> ServiceResult<Json<Vec<Post>>> {
    let field = params
        .term
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(FACE_FIELD);

    let posts = ctx.gateway.cluster_search(field).await?;
    Ok(Json(posts))
}
