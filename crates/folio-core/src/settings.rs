//! Settings domain types and validation.
//!
//! All fields are optional so a partially filled settings value (from a
//! `.env` file, environment variables or CLI flags) falls back to defaults
//! through the `effective_*` accessors.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::paths::{PathError, StorageRoots, data_root, normalize_user_path};
use crate::retry::BackoffPolicy;

/// Default number of parallel download workers.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

/// Default number of orphaned moments and front pages kept by the scrubber.
pub const DEFAULT_KEEP_LATEST_MOMENTS: usize = 10;

/// Default interval between scheduled scrub passes.
pub const DEFAULT_SCRUB_INTERVAL_DAYS: u32 = 7;

/// Default delay before the first connectivity re-check.
pub const DEFAULT_BACKOFF_INITIAL_MS: u64 = 200;

/// Default cap for the connectivity re-check delay.
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

/// Application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory for the database and default storage roots.
    pub data_dir: Option<String>,

    /// Root for internally stored downloads.
    pub internal_storage_dir: Option<String>,

    /// Root for externally stored downloads (removable media).
    pub external_storage_dir: Option<String>,

    /// Transient directory for files prepared for sharing.
    pub share_cache_dir: Option<String>,

    /// Endpoint probed to decide whether the network is back.
    pub health_check_url: Option<String>,

    /// Base URL files are fetched from.
    pub content_base_url: Option<String>,

    /// Number of parallel download workers.
    pub max_concurrent_downloads: Option<usize>,

    /// Orphaned moments and front pages to keep.
    pub keep_latest_moments: Option<usize>,

    /// Days between scheduled scrub passes.
    pub scrub_interval_days: Option<u32>,

    /// First connectivity re-check delay in milliseconds.
    pub connection_backoff_initial_ms: Option<u64>,

    /// Connectivity re-check delay cap in milliseconds.
    pub connection_backoff_max_ms: Option<u64>,

    /// Outer bound on connectivity re-checks. Unset waits forever.
    pub connection_max_retries: Option<u32>,

    /// Image name of the default navigation button; never scrubbed.
    pub default_nav_button_name: Option<String>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            data_dir: None,
            internal_storage_dir: None,
            external_storage_dir: None,
            share_cache_dir: None,
            health_check_url: None,
            content_base_url: None,
            max_concurrent_downloads: Some(DEFAULT_MAX_CONCURRENT_DOWNLOADS),
            keep_latest_moments: Some(DEFAULT_KEEP_LATEST_MOMENTS),
            scrub_interval_days: Some(DEFAULT_SCRUB_INTERVAL_DAYS),
            connection_backoff_initial_ms: Some(DEFAULT_BACKOFF_INITIAL_MS),
            connection_backoff_max_ms: Some(DEFAULT_BACKOFF_MAX_MS),
            connection_max_retries: None,
            default_nav_button_name: None,
        }
    }

    /// Overlay `FOLIO_*` environment variables onto these settings.
    ///
    /// Unparseable numeric values are ignored with a warning.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        let string = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

        if let Some(v) = string("FOLIO_DATA_DIR") {
            self.data_dir = Some(v);
        }
        if let Some(v) = string("FOLIO_INTERNAL_STORAGE_DIR") {
            self.internal_storage_dir = Some(v);
        }
        if let Some(v) = string("FOLIO_EXTERNAL_STORAGE_DIR") {
            self.external_storage_dir = Some(v);
        }
        if let Some(v) = string("FOLIO_SHARE_CACHE_DIR") {
            self.share_cache_dir = Some(v);
        }
        if let Some(v) = string("FOLIO_HEALTH_CHECK_URL") {
            self.health_check_url = Some(v);
        }
        if let Some(v) = string("FOLIO_CONTENT_BASE_URL") {
            self.content_base_url = Some(v);
        }
        if let Some(v) = string("FOLIO_DEFAULT_NAV_BUTTON") {
            self.default_nav_button_name = Some(v);
        }
        if let Some(v) = parse_env("FOLIO_MAX_CONCURRENT_DOWNLOADS") {
            self.max_concurrent_downloads = Some(v);
        }
        if let Some(v) = parse_env("FOLIO_KEEP_LATEST_MOMENTS") {
            self.keep_latest_moments = Some(v);
        }
        if let Some(v) = parse_env("FOLIO_SCRUB_INTERVAL_DAYS") {
            self.scrub_interval_days = Some(v);
        }
        if let Some(v) = parse_env("FOLIO_BACKOFF_INITIAL_MS") {
            self.connection_backoff_initial_ms = Some(v);
        }
        if let Some(v) = parse_env("FOLIO_BACKOFF_MAX_MS") {
            self.connection_backoff_max_ms = Some(v);
        }
        if let Some(v) = parse_env("FOLIO_CONNECTION_MAX_RETRIES") {
            self.connection_max_retries = Some(v);
        }
        self
    }

    /// Get the effective worker count (with default fallback).
    #[must_use]
    pub fn effective_max_concurrent_downloads(&self) -> usize {
        self.max_concurrent_downloads
            .unwrap_or(DEFAULT_MAX_CONCURRENT_DOWNLOADS)
    }

    /// Get the effective moment retention count (with default fallback).
    #[must_use]
    pub fn effective_keep_latest_moments(&self) -> usize {
        self.keep_latest_moments
            .unwrap_or(DEFAULT_KEEP_LATEST_MOMENTS)
    }

    /// Get the effective scrub interval.
    #[must_use]
    pub fn scrub_interval(&self) -> Duration {
        let days = self
            .scrub_interval_days
            .unwrap_or(DEFAULT_SCRUB_INTERVAL_DAYS);
        Duration::from_secs(u64::from(days) * 24 * 60 * 60)
    }

    /// Backoff used while waiting for connectivity.
    #[must_use]
    pub fn connection_backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(
                self.connection_backoff_initial_ms
                    .unwrap_or(DEFAULT_BACKOFF_INITIAL_MS),
            ),
            Duration::from_millis(
                self.connection_backoff_max_ms
                    .unwrap_or(DEFAULT_BACKOFF_MAX_MS),
            ),
        )
        .with_max_retries(self.connection_max_retries)
    }

    /// Resolve the data directory.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, PathError> {
        match self.data_dir.as_deref() {
            Some(dir) => normalize_user_path(dir),
            None => data_root(),
        }
    }

    /// Resolve the storage roots; internal defaults to `<data>/files`.
    pub fn resolve_storage_roots(&self) -> Result<StorageRoots, PathError> {
        let internal = match self.internal_storage_dir.as_deref() {
            Some(dir) => normalize_user_path(dir)?,
            None => self.resolve_data_dir()?.join("files"),
        };
        let mut roots = StorageRoots::new(internal);
        if let Some(dir) = self.external_storage_dir.as_deref() {
            roots = roots.with_external(normalize_user_path(dir)?);
        }
        Ok(roots)
    }

    /// Resolve the share cache directory; defaults to `<data>/cache/share`.
    pub fn resolve_share_cache_dir(&self) -> Result<PathBuf, PathError> {
        match self.share_cache_dir.as_deref() {
            Some(dir) => normalize_user_path(dir),
            None => Ok(self.resolve_data_dir()?.join("cache").join("share")),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(target: "folio.settings", key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("At least one download worker is required")]
    NoWorkers,

    #[error("Scrub interval must be at least one day")]
    InvalidScrubInterval,

    #[error("Backoff cap {max_ms}ms is below the initial delay {initial_ms}ms")]
    InvalidBackoff { initial_ms: u64, max_ms: u64 },

    #[error("Health check URL must not be empty")]
    EmptyHealthCheckUrl,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.max_concurrent_downloads == Some(0) {
        return Err(SettingsError::NoWorkers);
    }

    if settings.scrub_interval_days == Some(0) {
        return Err(SettingsError::InvalidScrubInterval);
    }

    let initial_ms = settings
        .connection_backoff_initial_ms
        .unwrap_or(DEFAULT_BACKOFF_INITIAL_MS);
    let max_ms = settings
        .connection_backoff_max_ms
        .unwrap_or(DEFAULT_BACKOFF_MAX_MS);
    if max_ms < initial_ms {
        return Err(SettingsError::InvalidBackoff { initial_ms, max_ms });
    }

    if let Some(ref url) = settings.health_check_url {
        if url.trim().is_empty() {
            return Err(SettingsError::EmptyHealthCheckUrl);
        }
    }

    Ok(())
}
