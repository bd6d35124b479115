/// Post submission endpoint
use crate::{
    api::params,
    auth::AuthContext,
    context::AppContext,
    error::{ServiceError, ServiceResult},
    models::Location,
    pipeline::{MediaAttachment, Submission},
};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::post,
    Router,
};
use tracing::debug;

/// Build post routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/v1/post", post(submit_post))
}

/// Submit a geo-tagged post with an optional media file
///
/// Multipart fields: `message`, `lat`, `lon`, `image`. A file part with an
/// empty filename counts as no attachment.
async fn submit_post(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    mut multipart: Multipart,
) -> ServiceResult<StatusCode> {
    let mut message = String::new();
    let mut lat: Option<String> = None;
    let mut lon: Option<String> = None;
    let mut media: Option<MediaAttachment> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "message" => message = field.text().await.map_err(bad_multipart)?,
            "lat" => lat = Some(field.text().await.map_err(bad_multipart)?),
            "lon" => lon = Some(field.text().await.map_err(bad_multipart)?),
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::Media(format!("Failed to read media: {}", e)))?;

                if file_name.is_empty() {
                    continue;
                }
                media = Some(MediaAttachment {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let submission = Submission {
        user: auth.identity.username,
        message,
        location: Location::new(
            params::parse_latitude(lat.as_deref()),
            params::parse_longitude(lon.as_deref()),
        ),
        media,
    };

    ctx.pipeline.ingest(submission).await?;

    Ok(StatusCode::OK)
}

fn bad_multipart(e: MultipartError) -> ServiceError {
    ServiceError::Validation(format!("Malformed multipart body: {}", e))
}
