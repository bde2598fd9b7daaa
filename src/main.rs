// src/main.rs

use std::{error::Error, sync::Arc};

use quizbank::config::{Config, StorageConfig};
use quizbank::routes;
use quizbank::state::AppState;
use quizbank::storage::{MemoryStore, PgStore, QuizStore};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load configuration from environment (and .env, if present)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quizbank.log");
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

    let store = open_store(&config.storage).await?;
    let app = routes::create_router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn open_store(storage: &StorageConfig) -> Result<Arc<dyn QuizStore>, Box<dyn Error>> {
    match storage {
        StorageConfig::Postgres {
            database_url,
            max_connections,
            connect_retries,
        } => {
            let store = PgStore::connect(database_url, *max_connections, *connect_retries).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
