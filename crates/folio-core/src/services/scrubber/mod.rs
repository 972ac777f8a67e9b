//! Reference-tracking garbage collector for the content store.
//!
//! A pass walks the publication graph bottom-up in a fixed order. Each
//! phase queries the orphans of one entity type, so rows that only became
//! unreferenced through an earlier phase are picked up by a later one:
//!
//! 1. sections (skipping any holding a bookmarked article)
//! 2. moments, keeping the most recent K
//! 3. front pages, keeping the most recent K
//! 4. pages
//! 5. articles (skipping bookmarked ones)
//! 6. resource bundles older than the newest downloaded one
//! 7. images (except the default nav button)
//! 8. audio
//! 9. files, including their bytes on disk
//!
//! A delete that hits a foreign key (something started referencing the row
//! after the orphan query) leaves the row alone; the next pass retries. A
//! failed disk delete is reported and the pass goes on.
//!
//! The pass assumes it is the only writer to the store while it runs.

mod report;
mod retention;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::{Article, FileEntry, Section};
use crate::ports::{ContentStore, RepositoryError, TelemetryPort};
use crate::settings::{DEFAULT_KEEP_LATEST_MOMENTS, Settings};

use super::schedule::ScheduledTask;
use super::storage::StorageService;

pub use report::{PhaseStats, ScrubReport};
pub use retention::{keep_most_recent, outdated_resource_infos};

/// Unexpected failure that aborts a pass.
#[derive(Debug, Error)]
pub enum ScrubError {
    #[error("Content store failed during {phase}: {source}")]
    Store {
        phase: &'static str,
        #[source]
        source: RepositoryError,
    },
}

/// Scrubber tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubberConfig {
    /// Orphaned moments (and, independently, front pages) to keep.
    pub keep_latest_moments: usize,
    /// Image that is never deleted, whether referenced or not.
    pub default_nav_button_name: Option<String>,
    /// Transient share cache cleared by every pass.
    pub share_cache_dir: Option<PathBuf>,
}

impl Default for ScrubberConfig {
    fn default() -> Self {
        Self {
            keep_latest_moments: DEFAULT_KEEP_LATEST_MOMENTS,
            default_nav_button_name: None,
            share_cache_dir: None,
        }
    }
}

impl ScrubberConfig {
    /// Build from settings; the share cache directory is left unresolved
    /// when it cannot be determined.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            keep_latest_moments: settings.effective_keep_latest_moments(),
            default_nav_button_name: settings.default_nav_button_name.clone(),
            share_cache_dir: settings.resolve_share_cache_dir().ok(),
        }
    }
}

/// How a delete attempt ended.
enum Deletion {
    Deleted,
    Retained,
}

/// Deletes content no longer reachable from any retained root.
pub struct Scrubber {
    store: Arc<dyn ContentStore>,
    storage: StorageService,
    telemetry: Arc<dyn TelemetryPort>,
    config: ScrubberConfig,
}

impl Scrubber {
    pub fn new(
        store: Arc<dyn ContentStore>,
        storage: StorageService,
        telemetry: Arc<dyn TelemetryPort>,
        config: ScrubberConfig,
    ) -> Self {
        Self {
            store,
            storage,
            telemetry,
            config,
        }
    }

    /// Run a full pass.
    pub async fn scrub(&self) -> Result<ScrubReport, ScrubError> {
        info!(target: "folio.scrub", "starting scrub pass");
        let mut report = ScrubReport::default();

        self.scrub_sections(&mut report).await?;
        self.scrub_moments(&mut report).await?;
        self.scrub_front_pages(&mut report).await?;
        self.scrub_pages(&mut report).await?;
        self.scrub_articles(&mut report).await?;
        self.scrub_resource_infos(&mut report).await?;
        self.scrub_images(&mut report).await?;
        self.scrub_audios(&mut report).await?;
        self.scrub_files(&mut report).await?;
        report.share_cache_cleared = self.clear_share_cache().await;

        info!(
            target: "folio.scrub",
            deleted = report.total_deleted(),
            bytes_reclaimed = report.bytes_reclaimed,
            disk_errors = report.disk_errors,
            "scrub pass finished"
        );
        Ok(report)
    }

    /// Light pass: only clears the share cache.
    pub async fn scrub_minimal(&self) -> ScrubReport {
        ScrubReport {
            share_cache_cleared: self.clear_share_cache().await,
            ..ScrubReport::default()
        }
    }

    async fn clear_share_cache(&self) -> bool {
        let Some(dir) = self.config.share_cache_dir.as_deref() else {
            return false;
        };
        match StorageService::clear_directory(dir).await {
            Ok(()) => {
                debug!(target: "folio.scrub", dir = %dir.display(), "share cache cleared");
                true
            }
            Err(e) => {
                error!(target: "folio.scrub", dir = %dir.display(), error = %e, "could not clear share cache");
                false
            }
        }
    }

    // ---- phases ----

    async fn scrub_sections(&self, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let sections = self
            .store
            .get_orphaned_sections()
            .await
            .map_err(store_error("sections"))?;
        debug!(target: "folio.scrub", count = sections.len(), "orphaned sections");

        for section in sections {
            if self.has_bookmarked_article(&section).await? {
                warn!(
                    target: "folio.scrub",
                    section = %section.file_name,
                    "section holds a bookmarked article, retaining it"
                );
                report.sections.retained += 1;
                continue;
            }
            self.delete_section(&section, report).await?;
        }
        Ok(())
    }

    async fn scrub_moments(&self, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let moments = self
            .store
            .get_orphaned_moments()
            .await
            .map_err(store_error("moments"))?;
        let (kept, outdated) = keep_most_recent(moments, self.config.keep_latest_moments, |m| {
            m.issue_key.date
        });
        report.moments.retained += kept.len() as u64;

        for moment in outdated {
            let result = self.store.delete_moment(&moment.issue_key).await;
            let label = moment.issue_key.to_string();
            if let Deletion::Deleted = self.settle("moment", &label, result, &mut report.moments, false)? {
                for image in moment.images.iter().chain(&moment.credits) {
                    self.delete_image(image, report).await?;
                }
                for file in &moment.files {
                    self.delete_file(file, report).await?;
                }
            }
        }
        Ok(())
    }

    async fn scrub_front_pages(&self, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let front_pages = self
            .store
            .get_orphaned_front_pages()
            .await
            .map_err(store_error("front pages"))?;
        let (kept, outdated) =
            keep_most_recent(front_pages, self.config.keep_latest_moments, |f| {
                f.issue_key.date
            });
        report.front_pages.retained += kept.len() as u64;

        for front_page in outdated {
            let result = self.store.delete_front_page(&front_page).await;
            let label = front_page.issue_key.to_string();
            self.settle("front page", &label, result, &mut report.front_pages, false)?;
        }
        Ok(())
    }

    async fn scrub_pages(&self, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let pages = self
            .store
            .get_orphaned_pages()
            .await
            .map_err(store_error("pages"))?;

        for page in pages {
            let result = self.store.delete_page(&page.file_name).await;
            if let Deletion::Deleted = self.settle("page", &page.file_name, result, &mut report.pages, false)? {
                self.delete_file(&page.file_name, report).await?;
            }
        }
        Ok(())
    }

    async fn scrub_articles(&self, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let articles = self
            .store
            .get_orphaned_articles()
            .await
            .map_err(store_error("articles"))?;

        for article in articles {
            self.delete_article(&article, report, false).await?;
        }
        Ok(())
    }

    async fn scrub_resource_infos(&self, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let infos = self
            .store
            .get_orphaned_resource_infos()
            .await
            .map_err(store_error("resource infos"))?;
        let total = infos.len();
        let outdated = outdated_resource_infos(infos);
        report.resource_infos.retained += (total - outdated.len()) as u64;

        for info in outdated {
            let result = self.store.delete_resource_info(info.version).await;
            let label = info.version.to_string();
            if let Deletion::Deleted =
                self.settle("resource info", &label, result, &mut report.resource_infos, false)?
            {
                for file in &info.files {
                    self.delete_file(file, report).await?;
                }
            }
        }
        Ok(())
    }

    async fn scrub_images(&self, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let images = self
            .store
            .get_orphaned_images()
            .await
            .map_err(store_error("images"))?;

        for image in images {
            if self.is_nav_button(&image.file_name) {
                report.images.retained += 1;
                continue;
            }
            self.delete_image(&image.file_name, report).await?;
        }
        Ok(())
    }

    async fn scrub_audios(&self, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let audios = self
            .store
            .get_orphaned_audios()
            .await
            .map_err(store_error("audio"))?;

        for audio in audios {
            self.delete_audio(&audio.file_name, report).await?;
        }
        Ok(())
    }

    async fn scrub_files(&self, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let files = self
            .store
            .get_orphaned_files()
            .await
            .map_err(store_error("files"))?;

        for entry in files {
            self.delete_file_entry(entry, report, false).await?;
        }
        Ok(())
    }

    // ---- cascading deletes ----

    async fn has_bookmarked_article(&self, section: &Section) -> Result<bool, ScrubError> {
        for name in &section.articles {
            let article = self
                .store
                .get_article(name)
                .await
                .map_err(store_error("sections"))?;
            if article.is_some_and(|a| a.is_bookmarked()) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn delete_section(
        &self,
        section: &Section,
        report: &mut ScrubReport,
    ) -> Result<(), ScrubError> {
        let result = self.store.delete_section(&section.file_name).await;
        if let Deletion::Retained =
            self.settle("section", &section.file_name, result, &mut report.sections, false)?
        {
            return Ok(());
        }

        self.delete_file(&section.file_name, report).await?;
        if let Some(ref podcast) = section.podcast {
            self.delete_audio(podcast, report).await?;
        }
        for image in &section.images {
            self.delete_image(image, report).await?;
        }
        for name in &section.articles {
            let article = self
                .store
                .get_article(name)
                .await
                .map_err(store_error("sections"))?;
            if let Some(article) = article {
                self.delete_article(&article, report, true).await?;
            }
        }
        Ok(())
    }

    async fn delete_article(
        &self,
        article: &Article,
        report: &mut ScrubReport,
        cascade: bool,
    ) -> Result<(), ScrubError> {
        if article.is_bookmarked() {
            info!(target: "folio.scrub", article = %article.file_name, "article is bookmarked, retaining it");
            report.articles.retained += 1;
            return Ok(());
        }

        let result = self.store.delete_article(&article.file_name).await;
        if let Deletion::Retained =
            self.settle("article", &article.file_name, result, &mut report.articles, cascade)?
        {
            return Ok(());
        }

        self.delete_file(&article.file_name, report).await?;
        if let Some(ref audio) = article.audio {
            self.delete_audio(audio, report).await?;
        }
        for image in article.images.iter().chain(&article.author_images) {
            self.delete_image(image, report).await?;
        }
        Ok(())
    }

    async fn delete_image(&self, name: &str, report: &mut ScrubReport) -> Result<(), ScrubError> {
        if self.is_nav_button(name) {
            return Ok(());
        }
        let result = self.store.delete_image(name).await;
        if let Deletion::Deleted = self.settle("image", name, result, &mut report.images, true)? {
            self.delete_file(name, report).await?;
        }
        Ok(())
    }

    async fn delete_audio(&self, name: &str, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let result = self.store.delete_audio(name).await;
        if let Deletion::Deleted = self.settle("audio", name, result, &mut report.audios, true)? {
            self.delete_file(name, report).await?;
        }
        Ok(())
    }

    async fn delete_file(&self, name: &str, report: &mut ScrubReport) -> Result<(), ScrubError> {
        let entry = self
            .store
            .get_file(name)
            .await
            .map_err(store_error("files"))?;
        match entry {
            Some(entry) => self.delete_file_entry(entry, report, true).await,
            None => Ok(()),
        }
    }

    /// Delete the metadata row, then the bytes if they were materialized.
    async fn delete_file_entry(
        &self,
        entry: FileEntry,
        report: &mut ScrubReport,
        cascade: bool,
    ) -> Result<(), ScrubError> {
        let result = self.store.delete_file(&entry.name).await;
        if let Deletion::Retained =
            self.settle("file", &entry.name, result, &mut report.files, cascade)?
        {
            return Ok(());
        }

        match self.storage.remove_bytes(&entry).await {
            Ok(bytes) => report.bytes_reclaimed += bytes,
            Err(e) => {
                error!(target: "folio.scrub", file = %entry.name, error = %e, "could not delete file from disk");
                self.telemetry.report_error(&e);
                report.disk_errors += 1;
            }
        }
        Ok(())
    }

    /// Book-keep a delete attempt.
    ///
    /// Constraint violations and rows that vanished meanwhile are tolerated;
    /// anything else aborts the pass. Residual references reached through a
    /// cascade are expected and only logged at debug level.
    fn settle(
        &self,
        kind: &'static str,
        key: &str,
        result: Result<(), RepositoryError>,
        stats: &mut PhaseStats,
        cascade: bool,
    ) -> Result<Deletion, ScrubError> {
        match result {
            Ok(()) => {
                debug!(target: "folio.scrub", kind, key, "deleted");
                stats.deleted += 1;
                Ok(Deletion::Deleted)
            }
            Err(RepositoryError::Constraint(reason)) => {
                if cascade {
                    debug!(target: "folio.scrub", kind, key, %reason, "still referenced, keeping");
                } else {
                    warn!(target: "folio.scrub", kind, key, %reason, "still referenced, keeping");
                }
                stats.retained += 1;
                Ok(Deletion::Retained)
            }
            Err(RepositoryError::NotFound(_)) => Ok(Deletion::Retained),
            Err(source) => Err(ScrubError::Store { phase: kind, source }),
        }
    }

    fn is_nav_button(&self, name: &str) -> bool {
        self.config.default_nav_button_name.as_deref() == Some(name)
    }
}

fn store_error(phase: &'static str) -> impl Fn(RepositoryError) -> ScrubError {
    move |source| ScrubError::Store { phase, source }
}

/// Scheduled wrapper running a full pass.
pub struct ScrubTask {
    scrubber: Arc<Scrubber>,
}

impl ScrubTask {
    pub const fn new(scrubber: Arc<Scrubber>) -> Self {
        Self { scrubber }
    }
}

#[async_trait]
impl ScheduledTask for ScrubTask {
    fn name(&self) -> &'static str {
        "scrub"
    }

    async fn run(&self) -> anyhow::Result<()> {
        self.scrubber.scrub().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StorageLocation;
    use crate::paths::StorageRoots;
    use crate::domain::Image;
    use crate::ports::{MockContentStore, RecordingTelemetry};
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn scrubber_with(store: MockContentStore, roots: StorageRoots) -> (Scrubber, RecordingTelemetry) {
        let store: Arc<dyn ContentStore> = Arc::new(store);
        let telemetry = RecordingTelemetry::new();
        let scrubber = Scrubber::new(
            store.clone(),
            StorageService::new(store, roots),
            Arc::new(telemetry.clone()),
            ScrubberConfig::default(),
        );
        (scrubber, telemetry)
    }

    fn empty_store() -> MockContentStore {
        store_with_images(Vec::new())
    }

    fn store_with_images(images: Vec<Image>) -> MockContentStore {
        let mut store = MockContentStore::new();
        store.expect_get_orphaned_sections().returning(|| Ok(Vec::new()));
        store.expect_get_orphaned_moments().returning(|| Ok(Vec::new()));
        store.expect_get_orphaned_front_pages().returning(|| Ok(Vec::new()));
        store.expect_get_orphaned_pages().returning(|| Ok(Vec::new()));
        store.expect_get_orphaned_articles().returning(|| Ok(Vec::new()));
        store.expect_get_orphaned_resource_infos().returning(|| Ok(Vec::new()));
        store
            .expect_get_orphaned_images()
            .returning(move || Ok(images.clone()));
        store.expect_get_orphaned_audios().returning(|| Ok(Vec::new()));
        store
    }

    #[tokio::test]
    async fn test_constraint_violation_keeps_file() {
        let mut store = empty_store();
        store
            .expect_get_orphaned_files()
            .returning(|| Ok(vec![FileEntry::new("raced.png", "", 1)]));
        store
            .expect_delete_file()
            .returning(|_| Err(RepositoryError::Constraint("FOREIGN KEY constraint failed".into())));
        let (scrubber, telemetry) = scrubber_with(store, StorageRoots::new("/unused"));

        let report = scrubber.scrub().await.unwrap();

        assert_eq!(report.files.deleted, 0);
        assert_eq!(report.files.retained, 1);
        assert!(telemetry.errors().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_referenced_orphan_file_logs_warning() {
        let mut store = empty_store();
        store
            .expect_get_orphaned_files()
            .returning(|| Ok(vec![FileEntry::new("raced.png", "", 1)]));
        store
            .expect_delete_file()
            .returning(|_| Err(RepositoryError::Constraint("FOREIGN KEY constraint failed".into())));
        let (scrubber, _) = scrubber_with(store, StorageRoots::new("/unused"));

        scrubber.scrub().await.unwrap();

        logs_assert(|lines: &[&str]| {
            lines
                .iter()
                .any(|line| line.contains("WARN") && line.contains("still referenced"))
                .then_some(())
                .ok_or_else(|| "no warning for the retained file".to_string())
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_referenced_file_behind_image_logs_debug() {
        let mut store = store_with_images(vec![Image::new("cover.png")]);
        store.expect_get_orphaned_files().returning(|| Ok(Vec::new()));
        store.expect_delete_image().times(1).returning(|_| Ok(()));
        store
            .expect_get_file()
            .returning(|name| Ok(Some(FileEntry::new(name, "", 1))));
        store
            .expect_delete_file()
            .returning(|_| Err(RepositoryError::Constraint("FOREIGN KEY constraint failed".into())));
        let (scrubber, _) = scrubber_with(store, StorageRoots::new("/unused"));

        let report = scrubber.scrub().await.unwrap();

        assert_eq!(report.images.deleted, 1);
        assert_eq!(report.files.retained, 1);
        logs_assert(|lines: &[&str]| {
            let retained: Vec<_> = lines
                .iter()
                .filter(|line| line.contains("still referenced"))
                .collect();
            match retained.as_slice() {
                [line] if line.contains("DEBUG") => Ok(()),
                other => Err(format!("unexpected retention logs: {other:?}")),
            }
        });
    }

    #[tokio::test]
    async fn test_disk_failure_is_reported_and_pass_continues() {
        let temp = tempdir().unwrap();
        // a directory where the file should be makes remove_file fail
        std::fs::create_dir_all(temp.path().join("blocked.pdf/inner")).unwrap();
        std::fs::write(temp.path().join("ok.pdf"), b"1234").unwrap();

        let stored = |name: &str| {
            let mut entry = FileEntry::new(name, "", 1);
            entry.storage_location = StorageLocation::Internal;
            entry
        };
        let files = vec![stored("blocked.pdf"), stored("ok.pdf")];

        let mut store = empty_store();
        store
            .expect_get_orphaned_files()
            .returning(move || Ok(files.clone()));
        store.expect_delete_file().times(2).returning(|_| Ok(()));
        let (scrubber, telemetry) = scrubber_with(store, StorageRoots::new(temp.path()));

        let report = scrubber.scrub().await.unwrap();

        assert_eq!(report.files.deleted, 2);
        assert_eq!(report.disk_errors, 1);
        assert_eq!(report.bytes_reclaimed, 4);
        assert_eq!(telemetry.errors().len(), 1);
        assert!(!temp.path().join("ok.pdf").exists());
    }

    #[tokio::test]
    async fn test_unexpected_store_error_aborts_pass() {
        let mut store = MockContentStore::new();
        store
            .expect_get_orphaned_sections()
            .returning(|| Err(RepositoryError::Storage("disk I/O error".into())));
        let (scrubber, _) = scrubber_with(store, StorageRoots::new("/unused"));

        let err = scrubber.scrub().await.unwrap_err();
        assert!(err.to_string().contains("sections"));
    }

    #[tokio::test]
    async fn test_minimal_clears_share_cache_only() {
        let temp = tempdir().unwrap();
        let share = temp.path().join("share");
        std::fs::create_dir_all(&share).unwrap();
        std::fs::write(share.join("article.pdf"), b"x").unwrap();

        let store: Arc<dyn ContentStore> = Arc::new(MockContentStore::new());
        let scrubber = Scrubber::new(
            store.clone(),
            StorageService::new(store, StorageRoots::new(temp.path())),
            Arc::new(RecordingTelemetry::new()),
            ScrubberConfig {
                share_cache_dir: Some(share.clone()),
                ..ScrubberConfig::default()
            },
        );

        let report = scrubber.scrub_minimal().await;

        assert!(report.share_cache_cleared);
        assert_eq!(report.total_deleted(), 0);
        assert!(!share.exists());
    }
}
