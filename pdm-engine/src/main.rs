//! pdm-engine - Assessment Pipeline Microservice
//!
//! Runs the matrix and diagram generation pipelines for privacy impact
//! assessments, exposing HTTP triggers and SSE progress streaming.

use anyhow::Result;
use pdm_common::jobs::JobRegistry;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pdm_engine::genai::GenerationClient;
use pdm_engine::AppState;

const DEFAULT_PORT: u16 = 5810;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting pdm-engine (Assessment Pipeline) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Load configuration and resolve root folder
    let toml_config = pdm_common::config::TomlConfig::load()?;
    let root_folder = pdm_common::config::resolve_root_folder(None, &toml_config);
    pdm_common::config::ensure_root_folder(&root_folder)?;

    // Step 2: Open or create database
    let db_path = root_folder.join("pdm.db");
    info!("Database: {}", db_path.display());
    let db_pool = pdm_engine::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Step 3: Generation provider (env keys with TOML fallback)
    let generation = match GenerationClient::from_config(&toml_config.generation) {
        Ok(client) => {
            info!("Generation provider configured: {}", client.provider_name());
            Some(std::sync::Arc::new(client))
        }
        Err(e) => {
            warn!("{} - AI-assisted endpoints disabled", e);
            None
        }
    };

    // Step 4: Job registry and application state
    let jobs = JobRegistry::new();
    let state = AppState::new(db_pool, jobs, generation);

    // Build router and serve
    let app = pdm_engine::build_router(state);

    let port = toml_config.server.port.unwrap_or(DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
