//! CLI bootstrap: the composition root.
//!
//! The only place concrete adapters are wired together:
//! - `SQLite` content store (via folio-db)
//! - Storage service and scrubber (via folio-core)
//! - Download engine over reqwest (via folio-download), built on demand
//!
//! Handlers receive the composed [`CliContext`].

use std::sync::Arc;

use folio_core::{
    ContentStore, Scrubber, ScrubberConfig, Settings, StorageRoots, StorageService,
    TelemetryPort, TracingTelemetry, ensure_directory, validate_settings,
};
use folio_db::StoreFactory;
use folio_download::{DownloadEngine, EngineDeps, HttpBackend, ReqwestBackend};

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: Settings,
}

impl CliConfig {
    /// Defaults overlaid with `FOLIO_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            settings: Settings::with_defaults().with_env_overrides(),
        }
    }

    #[must_use]
    pub fn with_data_dir(mut self, data_dir: Option<String>) -> Self {
        if data_dir.is_some() {
            self.settings.data_dir = data_dir;
        }
        self
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub settings: Settings,
    pub store: Arc<dyn ContentStore>,
    pub storage: StorageService,
    pub scrubber: Arc<Scrubber>,
    pub telemetry: Arc<dyn TelemetryPort>,
}

impl CliContext {
    pub const fn roots(&self) -> &StorageRoots {
        self.storage.roots()
    }

    /// Build a download engine over reqwest.
    ///
    /// The health check falls back to `base_url` when none is configured.
    pub fn download_engine(&self, base_url: &str) -> Result<Arc<DownloadEngine>, CliError> {
        let backend = ReqwestBackend::new()
            .map_err(|e| CliError::Config(format!("HTTP client: {e}")))?;
        Ok(self.download_engine_with(Arc::new(backend), base_url))
    }

    /// Build a download engine over the given backend.
    pub fn download_engine_with(
        &self,
        backend: Arc<dyn HttpBackend>,
        base_url: &str,
    ) -> Arc<DownloadEngine> {
        let health_check_url = self
            .settings
            .health_check_url
            .clone()
            .unwrap_or_else(|| base_url.to_string());
        Arc::new(DownloadEngine::new(EngineDeps {
            backend,
            store: Arc::clone(&self.store),
            telemetry: Arc::clone(&self.telemetry),
            health_check_url,
            backoff: self.settings.connection_backoff(),
            max_concurrent_downloads: self.settings.effective_max_concurrent_downloads(),
        }))
    }
}

/// Bootstrap the CLI application.
///
/// Validates settings, opens the database under the data directory and
/// assembles the services.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let settings = config.settings;
    validate_settings(&settings)?;

    let data_dir = settings.resolve_data_dir()?;
    ensure_directory(&data_dir)?;
    let store = StoreFactory::open(&data_dir.join("folio.db"))
        .await
        .map_err(|e| CliError::Database(format!("{e:#}")))?;
    let roots = settings.resolve_storage_roots()?;

    Ok(bootstrap_with(settings, store, roots))
}

/// Compose a context over an existing store (for testing).
pub fn bootstrap_with(
    settings: Settings,
    store: Arc<dyn ContentStore>,
    roots: StorageRoots,
) -> CliContext {
    let telemetry: Arc<dyn TelemetryPort> = Arc::new(TracingTelemetry);
    let storage = StorageService::new(Arc::clone(&store), roots);
    let scrubber = Arc::new(Scrubber::new(
        Arc::clone(&store),
        storage.clone(),
        Arc::clone(&telemetry),
        ScrubberConfig::from_settings(&settings),
    ));
    CliContext {
        settings,
        store,
        storage,
        scrubber,
        telemetry,
    }
}
