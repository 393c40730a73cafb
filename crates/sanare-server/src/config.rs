//! Server configuration, read from environment variables at startup.
//!
//! Every setting has a development-friendly default, so a bare `cargo run`
//! brings up a working server.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./sanare.db`
    pub database_path: PathBuf,

    /// Filesystem path where uploaded images are stored, partitioned into
    /// `profiles/` and `blogs/` subdirectories.
    /// Env: `UPLOADS_DIR`
    /// Default: `./uploads`
    pub uploads_dir: PathBuf,

    /// HMAC secret for signing and verifying bearer tokens.
    /// Env: `JWT_SECRET`
    /// Default: `dev-secret` (development only; a warning is logged).
    pub jwt_secret: String,

    /// Absolute origin (e.g. `https://api.example.com`) used when rewriting
    /// stored `/uploads/...` paths into client-renderable URLs. When unset,
    /// the origin is derived from each request's `Host` header.
    /// Env: `PUBLIC_ORIGIN`
    /// Default: unset.
    pub public_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 5000).into(),
            database_path: PathBuf::from("./sanare.db"),
            uploads_dir: PathBuf::from("./uploads"),
            jwt_secret: "dev-secret".to_string(),
            public_origin: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("UPLOADS_DIR") {
            config.uploads_dir = PathBuf::from(path);
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                config.jwt_secret = secret;
            }
        }
        if config.jwt_secret == "dev-secret" {
            tracing::warn!("JWT_SECRET not set, using development default");
        }

        if let Ok(origin) = std::env::var("PUBLIC_ORIGIN") {
            let origin = origin.trim().trim_end_matches('/').to_string();
            if !origin.is_empty() {
                config.public_origin = Some(origin);
            }
        }

        // RUST_LOG goes straight to tracing-subscriber's EnvFilter and is
        // not stored here.

        config
    }
}
