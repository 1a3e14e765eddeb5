use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use quackhub_core::config::{
    archive_dir_from_env_value, database_path_from_env_value, gemini_api_url_from_env_value,
    gemini_model_from_env_value,
};
use quackhub_core::{
    AnalysisService, CoreConfig, FileResponseArchive, GeminiClient, GeminiConfig, RecordsService,
    SqliteQueryStore,
};

/// Main entry point for the QuackHub server
///
/// Opens both stores, connects the Gemini client and serves the REST API with Swagger UI.
///
/// # Environment Variables
/// - `QUACKHUB_REST_ADDR`: REST server address (default: "0.0.0.0:5000")
/// - `QUACKHUB_DATABASE_PATH`: SQLite primary store (default: "quackhub_data/queries.sqlite3")
/// - `QUACKHUB_ARCHIVE_DIR`: Response archive root (default: "quackhub_data/responses")
/// - `GEMINI_API_KEY`: Gemini API key (required)
/// - `GEMINI_MODEL`: Model name (default: "gemini-1.5-pro-002")
/// - `GEMINI_API_URL`: API base URL
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration is missing or invalid,
/// - either store cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quackhub=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("QUACKHUB_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".into());

    let cfg = CoreConfig::new(
        database_path_from_env_value(std::env::var("QUACKHUB_DATABASE_PATH").ok()),
        archive_dir_from_env_value(std::env::var("QUACKHUB_ARCHIVE_DIR").ok()),
    )?;

    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY must be set"))?;
    let gemini = Arc::new(GeminiConfig::new(
        api_key,
        gemini_model_from_env_value(std::env::var("GEMINI_MODEL").ok()),
        gemini_api_url_from_env_value(std::env::var("GEMINI_API_URL").ok()),
    )?);

    let queries = Arc::new(SqliteQueryStore::open(cfg.database_path())?);
    let archive = Arc::new(FileResponseArchive::new(PathBuf::from(cfg.archive_dir())));
    let model = Arc::new(GeminiClient::new(gemini.clone()));

    tracing::info!("++ Primary store: SQLite at {}", cfg.database_path().display());
    tracing::info!("++ Response archive: {}", cfg.archive_dir().display());
    tracing::info!("++ Model: {} via {}", gemini.model(), gemini.api_url());

    let state = AppState {
        analysis: Arc::new(AnalysisService::new(
            queries.clone(),
            archive.clone(),
            model,
        )),
        records: Arc::new(RecordsService::new(queries, archive)),
    };

    tracing::info!("++ Starting QuackHub REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, api_rest::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- QuackHub REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
