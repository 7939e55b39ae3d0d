mod config;
mod db;
mod errors;
mod generator;
mod media;
mod models;
mod planner;
mod provider;
mod routes;
mod scheduler;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::media::S3MediaStore;
use crate::planner::trends::{HttpTrendAnalyzer, NoTrendAnalyzer, TrendAnalyzer};
use crate::provider::gemini::GeminiClient;
use crate::routes::build_router;
use crate::scheduler::clock::SystemClock;
use crate::state::AppState;
use crate::store::pg::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{}={}", crate_target, &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting agrofeed API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool.clone()));

    // Initialize S3 / MinIO media store
    let s3 = build_s3_client(&config).await;
    let media = Arc::new(S3MediaStore::new(
        s3,
        config.s3_bucket.clone(),
        config.s3_endpoint.clone(),
    ));
    info!("Media store initialized (bucket: {})", config.s3_bucket);

    // Initialize generation provider
    let gemini = Arc::new(GeminiClient::new(config.gemini_api_key.clone()));
    info!(
        "Generation provider initialized (text: {}, tts: {}, image: {})",
        provider::gemini::TEXT_MODEL,
        provider::gemini::TTS_MODEL,
        provider::gemini::IMAGE_MODEL
    );

    // Trend analyzer degrades to "no signal" when unconfigured
    let trends: Arc<dyn TrendAnalyzer> = match &config.analytics_url {
        Some(url) => {
            info!("Trend analyzer initialized ({url})");
            Arc::new(HttpTrendAnalyzer::new(url.clone()))
        }
        None => {
            info!("ANALYTICS_URL not set — planning will run without trend signal");
            Arc::new(NoTrendAnalyzer)
        }
    };

    // Build app state
    let state = AppState {
        db: pool.clone(),
        jobs: store.clone(),
        content: store.clone(),
        stages: store,
        trends,
        provider: gemini,
        media,
        clock: Arc::new(SystemClock),
        config: config.clone(),
    };

    // Start the weekly scheduler loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn(scheduler::run(state.clone(), shutdown_rx));

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the scheduler, release any claimed jobs, close the pool
    let _ = shutdown_tx.send(true);
    let _ = scheduler_task.await;
    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to listen for shutdown signal");
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "agrofeed-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
