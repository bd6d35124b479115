/// geopost - geo-tagged post ingestion and search service
///
/// Accepts posts with a location and a media attachment, stores the media in
/// a blob store, scores images for faces and indexes the post for radius and
/// cluster search.

mod annotation;
mod api;
mod auth;
mod blob_store;
mod config;
mod context;
mod error;
mod gateway;
mod index;
mod media;
mod metrics;
mod models;
mod pipeline;
mod server;
#[cfg(test)]
mod test_support;

use config::{LoggingConfig, ServerConfig};
use context::AppContext;
use error::ServiceResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ServiceResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    init_logging(&config.logging);

    // Print banner
    print_banner();

    metrics::init();

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(logging.env_filter());

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_banner() {
    println!(
        r#"
                                         __
   ____ ____  ____  ____  ____  _____/ /_
  / __ `/ _ \/ __ \/ __ \/ __ \/ ___/ __/
 / /_/ /  __/ /_/ / /_/ / /_/ (__  ) /_
 \__, /\___/\____/ .___/\____/____/\__/
/____/          /_/

        Geo-tagged post service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
