//! itemsync server
//!
//! Serves one collection of items as a realtime key-value store: keyed
//! writes and deletes over HTTP, full snapshots pushed over WebSocket.
//!
//! # Configuration
//!
//! Environment variables:
//! - `ITEMSYNC_PORT`: Port to listen on (default: 8080)
//! - `ITEMSYNC_DATA_DIR`: Directory holding `items.db` (default: ~/.local/share/itemsync-server)
//! - `ITEMSYNC_COLLECTION`: Collection path to serve (default: items)

use std::net::SocketAddr;
use std::path::PathBuf;

use itemsync::config::DEFAULT_COLLECTION;
use itemsync::server::{open_database, router, AppState, ItemTable};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Server configuration
#[derive(Debug, Clone)]
struct ServerConfig {
    /// Port to listen on
    port: u16,
    /// Directory holding the SQLite database
    data_dir: PathBuf,
    /// Collection path served
    collection: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("ITEMSYNC_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("ITEMSYNC_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("itemsync-server")
            });

        let collection = std::env::var("ITEMSYNC_COLLECTION")
            .map(|c| c.trim_matches('/').to_string())
            .ok()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        Self {
            port,
            data_dir,
            collection,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itemsync_server=info,itemsync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();

    let db_path = config.data_dir.join("items.db");
    tracing::info!("Database: {}", db_path.display());
    tracing::info!("Collection: {}", config.collection);

    let pool = open_database(&db_path).await?;
    let state = AppState::load(ItemTable::new(pool, config.collection)).await?;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
