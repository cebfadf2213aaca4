//! Server state and orchestration.

use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

use grf_storage::AssetStorage;
use grf_storage::paths::normalize;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::mime;
use crate::missing::MissingLog;

/// Shared state behind every request handler.
pub struct AppState {
    storage: AssetStorage,
    missing: MissingLog,
    whitelist: Vec<String>,
    started_at: SystemTime,
}

impl AppState {
    /// Open the storage stack described by the configuration.
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        let storage = AssetStorage::open(config.storage_config())?;
        Ok(Self {
            storage,
            missing: MissingLog::new(),
            whitelist: config.normalized_whitelist(),
            started_at: SystemTime::now(),
        })
    }

    pub fn storage(&self) -> &AssetStorage {
        &self.storage
    }

    pub fn missing(&self) -> &MissingLog {
        &self.missing
    }

    /// Whether a normalized request path starts inside a servable
    /// top-level directory.
    pub fn is_whitelisted(&self, normalized_path: &str) -> bool {
        let top = normalized_path.split('/').next().unwrap_or("");
        self.whitelist.iter().any(|dir| dir == top)
    }

    /// Resolve one request path to its content and MIME type.
    ///
    /// `None` covers both whitelist rejections and genuine misses;
    /// only the latter feed the missing-files log.
    pub fn serve(&self, request_path: &str) -> Option<(Arc<Vec<u8>>, &'static str)> {
        let normalized = normalize(request_path);
        if !self.is_whitelisted(&normalized) {
            debug!(path = %normalized, "request outside whitelist");
            return None;
        }
        match self.storage.get_asset(request_path) {
            Some(data) => Some((data, mime::from_path(&normalized))),
            None => {
                self.missing.record(&normalized);
                None
            }
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.started_at)
            .unwrap_or_default()
            .as_secs()
    }
}

/// The running server.
pub struct Server {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl Server {
    /// Validate configuration and open the storage.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let state = AppState::new(&config)?;

        let stats = state.storage().stats();
        info!(
            archives = stats.archives,
            indexed_keys = stats.indexed_keys,
            whitelist = ?config.normalized_whitelist(),
            "server initialized"
        );

        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    /// Serve until interrupted.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = crate::http::create_router(Arc::clone(&self.state));

        let listener = tokio::net::TcpListener::bind(self.config.bind)
            .await
            .map_err(|source| ServerError::BindFailed {
                addr: self.config.bind,
                source,
            })?;

        info!("listening on {}", self.config.bind);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown signal received");
            })
            .await
            .map_err(|e| ServerError::Shutdown(e.to_string()))
    }
}
