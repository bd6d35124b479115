/// API routes and handlers
pub mod health;
pub mod media;
pub mod middleware;
pub mod params;
pub mod posts;
pub mod search;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(posts::routes())
        .merge(search::routes())
        .merge(media::routes())
}
