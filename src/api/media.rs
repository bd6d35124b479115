/// Serving of published media from the disk blob store
use crate::{
    context::AppContext,
    error::{ServiceError, ServiceResult},
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

/// Build media routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/media/:key", get(get_media))
}

/// Get a published media object by key
///
/// Objects that are staged but not yet published are not served.
async fn get_media(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> ServiceResult<Response> {
    let data = ctx
        .blob_store
        .get(&key)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Media not found: {}", key)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        data,
    )
        .into_response())
}
