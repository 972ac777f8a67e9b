//! `SQLite` implementation of the content store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{
    Article, Audio, ContentStore, FileEntry, FrontPage, Image, Issue, IssueKey, Moment, Page,
    RepositoryError, ResourceInfo, Section, StorageLocation,
};
use sqlx::SqlitePool;

use super::{articles, files, issues, media};

/// `SQLite` backed content store.
///
/// Composite saves and deletes run in a single transaction each.
pub struct SqliteContentStore {
    pool: SqlitePool,
}

impl SqliteContentStore {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[cfg(test)]
    pub(crate) const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn get_file(&self, name: &str) -> Result<Option<FileEntry>, RepositoryError> {
        files::get_file(&self.pool, name).await
    }

    async fn save_file(&self, entry: &FileEntry) -> Result<(), RepositoryError> {
        files::save_file(&self.pool, entry).await
    }

    async fn delete_file(&self, name: &str) -> Result<(), RepositoryError> {
        files::delete_file(&self.pool, name).await
    }

    async fn mark_download(
        &self,
        name: &str,
        date: Option<DateTime<Utc>>,
        location: StorageLocation,
    ) -> Result<(), RepositoryError> {
        files::mark_download(&self.pool, name, date, location).await
    }

    async fn get_orphaned_files(&self) -> Result<Vec<FileEntry>, RepositoryError> {
        files::get_orphaned_files(&self.pool).await
    }

    async fn get_image(&self, name: &str) -> Result<Option<Image>, RepositoryError> {
        media::get_image(&self.pool, name).await
    }

    async fn save_image(&self, image: &Image) -> Result<(), RepositoryError> {
        media::save_image(&self.pool, image).await
    }

    async fn delete_image(&self, name: &str) -> Result<(), RepositoryError> {
        media::delete_image(&self.pool, name).await
    }

    async fn get_orphaned_images(&self) -> Result<Vec<Image>, RepositoryError> {
        media::get_orphaned_images(&self.pool).await
    }

    async fn get_audio(&self, name: &str) -> Result<Option<Audio>, RepositoryError> {
        media::get_audio(&self.pool, name).await
    }

    async fn save_audio(&self, audio: &Audio) -> Result<(), RepositoryError> {
        media::save_audio(&self.pool, audio).await
    }

    async fn delete_audio(&self, name: &str) -> Result<(), RepositoryError> {
        media::delete_audio(&self.pool, name).await
    }

    async fn get_orphaned_audios(&self) -> Result<Vec<Audio>, RepositoryError> {
        media::get_orphaned_audios(&self.pool).await
    }

    async fn get_page(&self, name: &str) -> Result<Option<Page>, RepositoryError> {
        media::get_page(&self.pool, name).await
    }

    async fn save_page(&self, page: &Page) -> Result<(), RepositoryError> {
        media::save_page(&self.pool, page).await
    }

    async fn delete_page(&self, name: &str) -> Result<(), RepositoryError> {
        media::delete_page(&self.pool, name).await
    }

    async fn get_orphaned_pages(&self) -> Result<Vec<Page>, RepositoryError> {
        media::get_orphaned_pages(&self.pool).await
    }

    async fn get_article(&self, name: &str) -> Result<Option<Article>, RepositoryError> {
        articles::get_article(&self.pool, name).await
    }

    async fn save_article(&self, article: &Article) -> Result<(), RepositoryError> {
        articles::save_article(&self.pool, article).await
    }

    async fn delete_article(&self, name: &str) -> Result<(), RepositoryError> {
        articles::delete_article(&self.pool, name).await
    }

    async fn get_orphaned_articles(&self) -> Result<Vec<Article>, RepositoryError> {
        articles::get_orphaned_articles(&self.pool).await
    }

    async fn get_section(&self, name: &str) -> Result<Option<Section>, RepositoryError> {
        articles::get_section(&self.pool, name).await
    }

    async fn save_section(&self, section: &Section) -> Result<(), RepositoryError> {
        articles::save_section(&self.pool, section).await
    }

    async fn delete_section(&self, name: &str) -> Result<(), RepositoryError> {
        articles::delete_section(&self.pool, name).await
    }

    async fn get_orphaned_sections(&self) -> Result<Vec<Section>, RepositoryError> {
        articles::get_orphaned_sections(&self.pool).await
    }

    async fn get_moment(&self, key: &IssueKey) -> Result<Option<Moment>, RepositoryError> {
        issues::get_moment(&self.pool, key).await
    }

    async fn save_moment(&self, moment: &Moment) -> Result<(), RepositoryError> {
        issues::save_moment(&self.pool, moment).await
    }

    async fn delete_moment(&self, key: &IssueKey) -> Result<(), RepositoryError> {
        issues::delete_moment(&self.pool, key).await
    }

    async fn get_orphaned_moments(&self) -> Result<Vec<Moment>, RepositoryError> {
        issues::get_orphaned_moments(&self.pool).await
    }

    async fn save_front_page(&self, front_page: &FrontPage) -> Result<(), RepositoryError> {
        issues::save_front_page(&self.pool, front_page).await
    }

    async fn delete_front_page(&self, front_page: &FrontPage) -> Result<(), RepositoryError> {
        issues::delete_front_page(&self.pool, front_page).await
    }

    async fn get_orphaned_front_pages(&self) -> Result<Vec<FrontPage>, RepositoryError> {
        issues::get_orphaned_front_pages(&self.pool).await
    }

    async fn get_resource_info(
        &self,
        version: i64,
    ) -> Result<Option<ResourceInfo>, RepositoryError> {
        issues::get_resource_info(&self.pool, version).await
    }

    async fn save_resource_info(&self, info: &ResourceInfo) -> Result<(), RepositoryError> {
        issues::save_resource_info(&self.pool, info).await
    }

    async fn delete_resource_info(&self, version: i64) -> Result<(), RepositoryError> {
        issues::delete_resource_info(&self.pool, version).await
    }

    async fn get_orphaned_resource_infos(&self) -> Result<Vec<ResourceInfo>, RepositoryError> {
        issues::get_orphaned_resource_infos(&self.pool).await
    }

    async fn get_issue(&self, key: &IssueKey) -> Result<Option<Issue>, RepositoryError> {
        issues::get_issue(&self.pool, key).await
    }

    async fn save_issue(&self, issue: &Issue) -> Result<(), RepositoryError> {
        issues::save_issue(&self.pool, issue).await
    }

    async fn delete_issue(&self, key: &IssueKey) -> Result<(), RepositoryError> {
        issues::delete_issue(&self.pool, key).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use folio_core::IssueStatus;

    use super::*;
    use crate::setup::setup_test_database;

    async fn store() -> SqliteContentStore {
        SqliteContentStore::new(setup_test_database().await.unwrap())
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn key(day: u32) -> IssueKey {
        IssueKey::new("taz", date(day), IssueStatus::Regular)
    }

    async fn file(store: &SqliteContentStore, name: &str) {
        store
            .save_file(&FileEntry::new(name, "2024-03", 1_000))
            .await
            .unwrap();
    }

    async fn image(store: &SqliteContentStore, name: &str) {
        file(store, name).await;
        store.save_image(&Image::new(name)).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_file_keeps_newer_entry() {
        let store = store().await;
        let newer = FileEntry::new("a.html", "x", 2_000).with_sha256("new");
        let older = FileEntry::new("a.html", "x", 1_000).with_sha256("old");

        store.save_file(&newer).await.unwrap();
        store.save_file(&older).await.unwrap();

        let stored = store.get_file("a.html").await.unwrap().unwrap();
        assert_eq!(stored.mo_time, 2_000);
        assert_eq!(stored.sha256.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_save_file_preserves_download_state() {
        let store = store().await;
        file(&store, "a.html").await;
        let now = Utc::now();
        store
            .mark_download("a.html", Some(now), StorageLocation::External)
            .await
            .unwrap();

        store
            .save_file(&FileEntry::new("a.html", "2024-03", 1_500))
            .await
            .unwrap();

        let stored = store.get_file("a.html").await.unwrap().unwrap();
        assert_eq!(stored.mo_time, 1_500);
        assert!(stored.is_downloaded());
        assert_eq!(stored.storage_location, StorageLocation::External);
    }

    #[tokio::test]
    async fn test_mark_download_updates_both_columns() {
        let store = store().await;
        file(&store, "a.html").await;

        store
            .mark_download("a.html", Some(Utc::now()), StorageLocation::Internal)
            .await
            .unwrap();
        let stored = store.get_file("a.html").await.unwrap().unwrap();
        assert!(stored.is_downloaded());
        assert_eq!(stored.storage_location, StorageLocation::Internal);

        store
            .mark_download("a.html", None, StorageLocation::NotStored)
            .await
            .unwrap();
        let stored = store.get_file("a.html").await.unwrap().unwrap();
        assert!(!stored.is_downloaded());
        assert_eq!(stored.storage_location, StorageLocation::NotStored);
    }

    #[tokio::test]
    async fn test_mark_download_missing_file_is_not_found() {
        let store = store().await;
        let err = store
            .mark_download("nope", Some(Utc::now()), StorageLocation::Internal)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_referenced_file_is_constraint_violation() {
        let store = store().await;
        image(&store, "cover.png").await;

        let err = store.delete_file("cover.png").await.unwrap_err();
        assert!(err.is_constraint(), "unexpected error: {err:?}");
        assert!(store.get_file("cover.png").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_not_found() {
        let store = store().await;
        let err = store.delete_file("nope").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_orphaned_files_excludes_referenced() {
        let store = store().await;
        image(&store, "used.png").await;
        file(&store, "loose.css").await;

        let orphans: Vec<String> = store
            .get_orphaned_files()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(orphans, vec!["loose.css".to_string()]);
    }

    #[tokio::test]
    async fn test_article_round_trip_with_joins() {
        let store = store().await;
        file(&store, "art.html").await;
        image(&store, "pic.jpg").await;
        image(&store, "author.jpg").await;
        file(&store, "talk.mp3").await;
        store.save_audio(&Audio::new("talk.mp3")).await.unwrap();

        let mut article = Article::new("art.html", "taz", date(1));
        article.title = Some("Title".into());
        article.audio = Some("talk.mp3".into());
        article.images = vec!["pic.jpg".into()];
        article.author_images = vec!["author.jpg".into()];
        store.save_article(&article).await.unwrap();

        let loaded = store.get_article("art.html").await.unwrap().unwrap();
        assert_eq!(loaded, article);

        // The audio is referenced by the article now
        let err = store.delete_audio("talk.mp3").await.unwrap_err();
        assert!(err.is_constraint());
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let store = store().await;
        file(&store, "sec.html").await;

        let mut section = Section::new("sec.html", "taz", date(1));
        section.articles = vec!["missing.html".into()];

        let err = store.save_section(&section).await.unwrap_err();
        assert!(err.is_constraint(), "unexpected error: {err:?}");
        assert!(store.get_section("sec.html").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_section_orphaned_until_issue_references_it() {
        let store = store().await;
        file(&store, "sec.html").await;
        store
            .save_section(&Section::new("sec.html", "taz", date(1)))
            .await
            .unwrap();
        assert_eq!(store.get_orphaned_sections().await.unwrap().len(), 1);

        let mut issue = Issue::new(key(1));
        issue.sections = vec!["sec.html".into()];
        store.save_issue(&issue).await.unwrap();
        assert!(store.get_orphaned_sections().await.unwrap().is_empty());

        store.delete_issue(&key(1)).await.unwrap();
        assert_eq!(store.get_orphaned_sections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_moments_orphaned_when_issue_missing() {
        let store = store().await;
        image(&store, "m1.png").await;
        image(&store, "credit.png").await;
        file(&store, "anim.html").await;

        let mut moment = Moment::new(key(2));
        moment.images = vec!["m1.png".into()];
        moment.credits = vec!["credit.png".into()];
        moment.files = vec!["anim.html".into()];
        store.save_moment(&moment).await.unwrap();
        assert_eq!(store.get_moment(&key(2)).await.unwrap(), Some(moment.clone()));

        assert_eq!(store.get_orphaned_moments().await.unwrap(), vec![moment]);

        store.save_issue(&Issue::new(key(2))).await.unwrap();
        assert!(store.get_orphaned_moments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_front_page_lifecycle() {
        let store = store().await;
        file(&store, "p1.pdf").await;
        store.save_page(&Page::new("p1.pdf")).await.unwrap();

        let front = FrontPage {
            issue_key: key(3),
            page: "p1.pdf".into(),
        };
        store.save_front_page(&front).await.unwrap();
        assert_eq!(store.get_orphaned_front_pages().await.unwrap(), vec![front.clone()]);
        assert!(store.get_orphaned_pages().await.unwrap().is_empty());

        store.delete_front_page(&front).await.unwrap();
        assert_eq!(store.get_orphaned_pages().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resource_infos_listed_by_version() {
        let store = store().await;
        file(&store, "res.css").await;
        for version in [3, 1, 2] {
            let mut info = ResourceInfo::new(version);
            info.files = vec!["res.css".into()];
            store.save_resource_info(&info).await.unwrap();
        }

        let versions: Vec<i64> = store
            .get_orphaned_resource_infos()
            .await
            .unwrap()
            .iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, vec![1, 2, 3]);

        store.delete_resource_info(2).await.unwrap();
        assert!(store.get_resource_info(2).await.unwrap().is_none());
        let info = store.get_resource_info(3).await.unwrap().unwrap();
        assert_eq!(info.files, vec!["res.css".to_string()]);
    }

    #[tokio::test]
    async fn test_issue_imprint_keeps_article() {
        let store = store().await;
        file(&store, "imprint.html").await;
        store
            .save_article(&Article::new("imprint.html", "taz", date(4)))
            .await
            .unwrap();

        let mut issue = Issue::new(key(4));
        issue.imprint = Some("imprint.html".into());
        store.save_issue(&issue).await.unwrap();

        assert!(store.get_orphaned_articles().await.unwrap().is_empty());
        let err = store.delete_article("imprint.html").await.unwrap_err();
        assert!(err.is_constraint());
        assert_eq!(store.get_issue(&key(4)).await.unwrap(), Some(issue));
    }

    #[tokio::test]
    async fn test_pool_enforces_foreign_keys() {
        let store = store().await;
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(row.0, 1);
    }
}
