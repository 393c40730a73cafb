//! # sanare-server
//!
//! REST API for the sanare hospital blog.
//!
//! This binary provides:
//! - **Account management**: signup with optional profile picture, login,
//!   and bearer-token identity (patients and doctors)
//! - **Blog publishing** with draft/published state, category tagging, and
//!   owner-only mutation
//! - **Image uploads** stored on disk under a type-partitioned `uploads/`
//!   directory and served back statically
//!
//! Persistence lives in the `sanare-store` crate; this crate owns the HTTP
//! surface, authorization policy, and response shaping.

mod api;
mod auth;
mod auth_api;
mod blogs_api;
mod category;
mod config;
mod error;
mod media_store;
mod shape;
mod upload_api;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sanare_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::media_store::MediaStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sanare_server=debug")),
        )
        .init();

    info!("Starting sanare API server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        database = %config.database_path.display(),
        uploads = %config.uploads_dir.display(),
        public_origin = config.public_origin.as_deref().unwrap_or("(derived from Host header)"),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Database (runs migrations on open)
    let db = Database::open_at(&config.database_path)?;

    // Media store (creates the uploads directories if missing)
    let media = MediaStore::new(config.uploads_dir.clone()).await?;

    let http_addr = config.http_addr;
    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        media: Arc::new(media),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    // Exit cleanly on whichever comes first: server failure or Ctrl+C.
    tokio::select! {
        result = api::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
