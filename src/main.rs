// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use mindmap_backend::{
    config::Config,
    exam::ExamEngine,
    llm::OpenAiClient,
    models::node::MindMap,
    routes,
    state::AppState,
    store::{MemorySessionStore, SqliteStore},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database with Retry
    let mut retry_count = 0;
    let store = loop {
        match SqliteStore::connect(&config.database_url).await {
            Ok(store) => break store,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to open database after 5 retries: {}", e);
                    return Err(e.into());
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    store.migrate().await?;
    tracing::info!("Migrations applied successfully.");

    let graph = MindMap::load(&config.mindmap_path).await?;
    tracing::info!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "Mind map loaded from {}",
        config.mindmap_path
    );

    let generator = OpenAiClient::new(
        &config.openai_api_key,
        &config.openai_base_url,
        &config.openai_model,
    )?;

    let store = Arc::new(store);
    let engine = ExamEngine::new(
        Arc::new(graph),
        store.clone(),
        store,
        Arc::new(generator),
    );

    // Create AppState
    let state = AppState {
        engine,
        sessions: Arc::new(MemorySessionStore::new()),
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    // Start the server
    axum::serve(listener, app).await?;

    Ok(())
}
