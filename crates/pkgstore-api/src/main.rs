//! pkgstore server binary
//!
//! Serves entity metadata over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # With config file
//! pkgstore --config config.yaml
//!
//! # With environment variables only, preloading entities
//! PKGSTORE_SERVER__PORT=9090 pkgstore --seed entities.json
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::signal;
use tracing::{error, info};

use pkgstore_api::adapters::entity_document;
use pkgstore_api::http::{create_router_with_timeout, AppState};
use pkgstore_api::observability::{init_logging, LoggingConfig};
use pkgstore_domain::EntityRef;
use pkgstore_server::ServerConfig;
use pkgstore_storage::{DocumentStore, MemoryDocumentStore};

/// pkgstore - entity metadata server
#[derive(Parser, Debug)]
#[command(name = "pkgstore")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,

    /// JSON file of entities to load into the store at startup
    #[arg(short, long)]
    seed: Option<String>,
}

/// One entry of a seed file.
#[derive(Debug, Deserialize)]
struct SeedEntity {
    id: EntityRef,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = args.config {
        ServerConfig::load(&config_path)?
    } else {
        ServerConfig::from_env()?
    };

    init_logging(LoggingConfig::from(&config.logging));

    info!(version = env!("CARGO_PKG_VERSION"), "Starting pkgstore server");

    let addr: SocketAddr = config.server.bind_address().parse()?;

    match config.storage.backend.as_str() {
        "memory" => {
            info!("Using in-memory storage backend");
            let storage = MemoryDocumentStore::new_shared();
            if let Some(seed) = &args.seed {
                let count = load_seed(storage.as_ref(), Path::new(seed)).await?;
                info!(count, path = %seed, "Loaded seed entities");
            }
            run_server(storage, addr, &config).await
        }
        _ => {
            error!("Unknown storage backend: {}", config.storage.backend);
            anyhow::bail!("Unknown storage backend: {}", config.storage.backend);
        }
    }
}

/// Stores every entity listed in the seed file at `path`.
async fn load_seed<S: DocumentStore>(storage: &S, path: &Path) -> anyhow::Result<usize> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let entities: Vec<SeedEntity> = serde_json::from_str(&data)
        .with_context(|| format!("parsing seed file {}", path.display()))?;

    let count = entities.len();
    for entity in entities {
        let mut doc = entity_document(&entity.id)
            .with_context(|| format!("seed entity {} is not fully specified", entity.id))?;
        doc.fields = entity.fields;
        storage.put_entity(doc).await?;
    }
    Ok(count)
}

/// Run the HTTP server with graceful shutdown.
async fn run_server<S: DocumentStore>(
    storage: Arc<S>,
    addr: SocketAddr,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(config.server.request_timeout_secs);
    let router = create_router_with_timeout(AppState::new(storage), timeout);

    info!(%addr, "HTTP server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// A signal that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
