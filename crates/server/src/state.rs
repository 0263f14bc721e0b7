//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Instant;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{TokenIssuer, UploadStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; gives handlers access to the database pool,
/// configuration, token issuer, and upload store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    tokens: TokenIssuer,
    uploads: UploadStore,
    started_at: Instant,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let tokens = TokenIssuer::new(
            config.jwt_secret.expose_secret().as_bytes(),
            config.jwt_refresh_secret.expose_secret().as_bytes(),
        );
        let uploads = UploadStore::new(&config.upload_dir);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                uploads,
                started_at: Instant::now(),
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the JWT issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }

    /// Get a reference to the upload store.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    /// Seconds since the server started, for the health check.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
