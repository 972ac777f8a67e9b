//! Content store port.
//!
//! Persistence of the publication graph. Every write is atomic: composite
//! entities are saved together with their join rows, deletions remove the
//! join rows and the entity row in one transaction.
//!
//! Deleting a row that is still referenced fails with
//! [`RepositoryError::Constraint`] and leaves the store untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::domain::{
    Article, Audio, FileEntry, FrontPage, Image, Issue, IssueKey, Moment, Page, ResourceInfo,
    Section, StorageLocation,
};

/// Port for the persisted publication graph.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    // ---- files ----

    /// Look up a file entry by name.
    async fn get_file(&self, name: &str) -> Result<Option<FileEntry>, RepositoryError>;

    /// Upsert a file entry.
    ///
    /// Last write wins by `mo_time`: an entry older than the stored one is
    /// ignored. The stored download date and storage location survive an
    /// upsert that does not carry them.
    async fn save_file(&self, entry: &FileEntry) -> Result<(), RepositoryError>;

    /// Delete a file entry.
    async fn delete_file(&self, name: &str) -> Result<(), RepositoryError>;

    /// Record (or clear) when the bytes of a file were downloaded and where
    /// they live. Both columns change together or not at all.
    async fn mark_download(
        &self,
        name: &str,
        date: Option<DateTime<Utc>>,
        location: StorageLocation,
    ) -> Result<(), RepositoryError>;

    /// Files referenced by no image, audio, page, article, section, moment or resource bundle.
    async fn get_orphaned_files(&self) -> Result<Vec<FileEntry>, RepositoryError>;

    // ---- images & audio ----

    async fn get_image(&self, name: &str) -> Result<Option<Image>, RepositoryError>;
    async fn save_image(&self, image: &Image) -> Result<(), RepositoryError>;
    async fn delete_image(&self, name: &str) -> Result<(), RepositoryError>;

    /// Images referenced by no article, section or moment.
    async fn get_orphaned_images(&self) -> Result<Vec<Image>, RepositoryError>;

    async fn get_audio(&self, name: &str) -> Result<Option<Audio>, RepositoryError>;
    async fn save_audio(&self, audio: &Audio) -> Result<(), RepositoryError>;
    async fn delete_audio(&self, name: &str) -> Result<(), RepositoryError>;

    /// Audio referenced by no article and no section podcast.
    async fn get_orphaned_audios(&self) -> Result<Vec<Audio>, RepositoryError>;

    // ---- pages ----

    async fn get_page(&self, name: &str) -> Result<Option<Page>, RepositoryError>;
    async fn save_page(&self, page: &Page) -> Result<(), RepositoryError>;
    async fn delete_page(&self, name: &str) -> Result<(), RepositoryError>;

    /// Pages belonging to no issue and used as no front page.
    async fn get_orphaned_pages(&self) -> Result<Vec<Page>, RepositoryError>;

    // ---- articles & sections ----

    async fn get_article(&self, name: &str) -> Result<Option<Article>, RepositoryError>;

    /// Save an article together with its image and author joins.
    async fn save_article(&self, article: &Article) -> Result<(), RepositoryError>;
    async fn delete_article(&self, name: &str) -> Result<(), RepositoryError>;

    /// Articles contained in no section and used as no imprint.
    async fn get_orphaned_articles(&self) -> Result<Vec<Article>, RepositoryError>;

    async fn get_section(&self, name: &str) -> Result<Option<Section>, RepositoryError>;

    /// Save a section together with its article and image joins.
    async fn save_section(&self, section: &Section) -> Result<(), RepositoryError>;
    async fn delete_section(&self, name: &str) -> Result<(), RepositoryError>;

    /// Sections belonging to no issue.
    async fn get_orphaned_sections(&self) -> Result<Vec<Section>, RepositoryError>;

    // ---- moments & front pages ----

    async fn get_moment(&self, key: &IssueKey) -> Result<Option<Moment>, RepositoryError>;
    async fn save_moment(&self, moment: &Moment) -> Result<(), RepositoryError>;
    async fn delete_moment(&self, key: &IssueKey) -> Result<(), RepositoryError>;

    /// Moments whose issue is not stored.
    async fn get_orphaned_moments(&self) -> Result<Vec<Moment>, RepositoryError>;

    async fn save_front_page(&self, front_page: &FrontPage) -> Result<(), RepositoryError>;
    async fn delete_front_page(&self, front_page: &FrontPage) -> Result<(), RepositoryError>;

    /// Front page join rows whose issue is not stored.
    async fn get_orphaned_front_pages(&self) -> Result<Vec<FrontPage>, RepositoryError>;

    // ---- resource bundles ----

    async fn get_resource_info(&self, version: i64)
    -> Result<Option<ResourceInfo>, RepositoryError>;
    async fn save_resource_info(&self, info: &ResourceInfo) -> Result<(), RepositoryError>;
    async fn delete_resource_info(&self, version: i64) -> Result<(), RepositoryError>;

    /// Every stored resource bundle, ascending by version.
    ///
    /// Nothing references a bundle, so all of them are candidates; the
    /// scrubber applies the version retention policy.
    async fn get_orphaned_resource_infos(&self) -> Result<Vec<ResourceInfo>, RepositoryError>;

    // ---- issues ----

    async fn get_issue(&self, key: &IssueKey) -> Result<Option<Issue>, RepositoryError>;

    /// Save an issue together with its section, page and imprint joins.
    async fn save_issue(&self, issue: &Issue) -> Result<(), RepositoryError>;

    /// Delete an issue and its joins. Children become orphans.
    async fn delete_issue(&self, key: &IssueKey) -> Result<(), RepositoryError>;
}
