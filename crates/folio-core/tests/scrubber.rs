//! Scrubber passes against a real in-memory `SQLite` store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use folio_core::{
    Article, Audio, ContentStore, FileEntry, FrontPage, Image, Issue, IssueKey, IssueStatus,
    Moment, Page, RecordingTelemetry, ResourceInfo, ScrubberConfig, Scrubber, Section,
    StorageLocation, StorageRoots, StorageService,
};
use folio_db::StoreFactory;
use tempfile::TempDir;

struct Fixture {
    store: Arc<dyn ContentStore>,
    temp: TempDir,
}

impl Fixture {
    async fn new() -> Self {
        Self {
            store: StoreFactory::open_in_memory().await.unwrap(),
            temp: tempfile::tempdir().unwrap(),
        }
    }

    fn root(&self) -> PathBuf {
        self.temp.path().join("files")
    }

    fn scrubber(&self, config: ScrubberConfig) -> Scrubber {
        Scrubber::new(
            self.store.clone(),
            StorageService::new(self.store.clone(), StorageRoots::new(self.root())),
            Arc::new(RecordingTelemetry::new()),
            config,
        )
    }

    async fn file(&self, name: &str) {
        self.store
            .save_file(&FileEntry::new(name, "", 1))
            .await
            .unwrap();
    }

    /// A file whose bytes exist on disk under the internal root.
    async fn stored_file(&self, name: &str) -> PathBuf {
        let mut entry = FileEntry::new(name, "", 1);
        entry.storage_location = StorageLocation::Internal;
        entry.date_download = Some(Utc::now());
        self.store.save_file(&entry).await.unwrap();

        let path = self.root().join(name);
        write_bytes(&path);
        path
    }

    async fn image(&self, name: &str) {
        self.file(name).await;
        self.store.save_image(&Image::new(name)).await.unwrap();
    }

    async fn audio(&self, name: &str) {
        self.file(name).await;
        self.store.save_audio(&Audio::new(name)).await.unwrap();
    }

    async fn article(&self, name: &str, bookmarked: bool) -> Article {
        self.file(name).await;
        let mut article = Article::new(name, "taz", day(1));
        if bookmarked {
            article.bookmarked_time = Some(Utc::now());
        }
        self.store.save_article(&article).await.unwrap();
        article
    }
}

fn write_bytes(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"bytes").unwrap();
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn key(d: u32) -> IssueKey {
    IssueKey::new("taz", day(d), IssueStatus::Regular)
}

#[tokio::test]
async fn test_bookmarked_article_keeps_its_section() {
    let fx = Fixture::new().await;
    fx.article("saved.html", true).await;
    fx.file("sec.html").await;
    let mut section = Section::new("sec.html", "taz", day(1));
    section.articles = vec!["saved.html".into()];
    fx.store.save_section(&section).await.unwrap();

    let report = fx.scrubber(ScrubberConfig::default()).scrub().await.unwrap();

    assert_eq!(report.sections.retained, 1);
    assert_eq!(report.total_deleted(), 0);
    assert!(fx.store.get_section("sec.html").await.unwrap().is_some());
    assert!(fx.store.get_article("saved.html").await.unwrap().is_some());
}

#[tokio::test]
async fn test_orphaned_section_cascades_to_children() {
    let fx = Fixture::new().await;
    let article_path = fx.stored_file("art.html").await;
    fx.image("pic.jpg").await;
    fx.audio("talk.mp3").await;
    let mut article = Article::new("art.html", "taz", day(1));
    article.images = vec!["pic.jpg".into()];
    article.audio = Some("talk.mp3".into());
    fx.store.save_article(&article).await.unwrap();

    fx.file("sec.html").await;
    let mut section = Section::new("sec.html", "taz", day(1));
    section.articles = vec!["art.html".into()];
    fx.store.save_section(&section).await.unwrap();

    let report = fx.scrubber(ScrubberConfig::default()).scrub().await.unwrap();

    assert_eq!(report.sections.deleted, 1);
    assert_eq!(report.articles.deleted, 1);
    assert_eq!(report.images.deleted, 1);
    assert_eq!(report.audios.deleted, 1);
    assert_eq!(report.files.deleted, 4);
    assert_eq!(report.bytes_reclaimed, 5);
    assert!(!article_path.exists());
    for name in ["sec.html", "art.html", "pic.jpg", "talk.mp3"] {
        assert!(fx.store.get_file(name).await.unwrap().is_none(), "{name} survived");
    }
}

#[tokio::test]
async fn test_issue_keeps_everything_reachable() {
    let fx = Fixture::new().await;
    fx.image("pic.jpg").await;
    fx.audio("podcast.mp3").await;
    let mut article = fx.article("art.html", false).await;
    article.images = vec!["pic.jpg".into()];
    fx.store.save_article(&article).await.unwrap();
    fx.article("imprint.html", false).await;

    fx.file("sec.html").await;
    let mut section = Section::new("sec.html", "taz", day(1));
    section.articles = vec!["art.html".into()];
    section.podcast = Some("podcast.mp3".into());
    fx.store.save_section(&section).await.unwrap();

    fx.file("p1.pdf").await;
    fx.store.save_page(&Page::new("p1.pdf")).await.unwrap();

    let mut issue = Issue::new(key(1));
    issue.sections = vec!["sec.html".into()];
    issue.pages = vec!["p1.pdf".into()];
    issue.imprint = Some("imprint.html".into());
    fx.store.save_issue(&issue).await.unwrap();

    fx.image("cover.png").await;
    let mut moment = Moment::new(key(1));
    moment.images = vec!["cover.png".into()];
    fx.store.save_moment(&moment).await.unwrap();

    let report = fx.scrubber(ScrubberConfig::default()).scrub().await.unwrap();

    assert_eq!(report.total_deleted(), 0);
    assert!(fx.store.get_article("art.html").await.unwrap().is_some());
    assert!(fx.store.get_article("imprint.html").await.unwrap().is_some());
    assert!(fx.store.get_audio("podcast.mp3").await.unwrap().is_some());
    assert!(fx.store.get_moment(&key(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_resource_infos_kept_without_newer_download() {
    let fx = Fixture::new().await;
    fx.file("res.css").await;
    for (version, downloaded) in [(1, true), (2, false), (3, false)] {
        let mut info = ResourceInfo::new(version);
        info.files = vec!["res.css".into()];
        if downloaded {
            info.date_download = Some(Utc::now());
        }
        fx.store.save_resource_info(&info).await.unwrap();
    }

    let report = fx.scrubber(ScrubberConfig::default()).scrub().await.unwrap();

    assert_eq!(report.resource_infos.deleted, 0);
    assert_eq!(report.resource_infos.retained, 3);
    assert_eq!(fx.store.get_orphaned_resource_infos().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_resource_infos_older_than_newest_download_are_deleted() {
    let fx = Fixture::new().await;
    fx.file("old.css").await;
    fx.file("shared.woff").await;
    fx.file("new.css").await;

    let mut v1 = ResourceInfo::new(1);
    v1.files = vec!["old.css".into(), "shared.woff".into()];
    v1.date_download = Some(Utc::now());
    let mut v2 = ResourceInfo::new(2);
    v2.files = vec!["new.css".into(), "shared.woff".into()];
    v2.date_download = Some(Utc::now());
    fx.store.save_resource_info(&v1).await.unwrap();
    fx.store.save_resource_info(&v2).await.unwrap();

    let report = fx.scrubber(ScrubberConfig::default()).scrub().await.unwrap();

    assert_eq!(report.resource_infos.deleted, 1);
    assert!(fx.store.get_resource_info(1).await.unwrap().is_none());
    assert!(fx.store.get_resource_info(2).await.unwrap().is_some());
    assert!(fx.store.get_file("old.css").await.unwrap().is_none());
    assert!(fx.store.get_file("shared.woff").await.unwrap().is_some());
    assert!(fx.store.get_file("new.css").await.unwrap().is_some());
}

#[tokio::test]
async fn test_keeps_latest_orphaned_moments_and_front_pages() {
    let fx = Fixture::new().await;
    for d in 1..=4 {
        let image = format!("moment-{d}.png");
        fx.image(&image).await;
        let mut moment = Moment::new(key(d));
        moment.images = vec![image];
        fx.store.save_moment(&moment).await.unwrap();

        let page = format!("front-{d}.pdf");
        fx.file(&page).await;
        fx.store.save_page(&Page::new(page.clone())).await.unwrap();
        fx.store
            .save_front_page(&FrontPage {
                issue_key: key(d),
                page,
            })
            .await
            .unwrap();
    }

    let config = ScrubberConfig {
        keep_latest_moments: 2,
        ..ScrubberConfig::default()
    };
    let report = fx.scrubber(config).scrub().await.unwrap();

    assert_eq!(report.moments.deleted, 2);
    assert_eq!(report.moments.retained, 2);
    assert_eq!(report.front_pages.deleted, 2);
    assert_eq!(report.front_pages.retained, 2);
    // pages of the dropped front pages become orphans in the same pass
    assert_eq!(report.pages.deleted, 2);

    let remaining: Vec<NaiveDate> = fx
        .store
        .get_orphaned_moments()
        .await
        .unwrap()
        .iter()
        .map(|m| m.issue_key.date)
        .collect();
    assert_eq!(remaining, vec![day(4), day(3)]);
    assert!(fx.store.get_image("moment-1.png").await.unwrap().is_none());
    assert!(fx.store.get_image("moment-4.png").await.unwrap().is_some());
    assert!(fx.store.get_page("front-2.pdf").await.unwrap().is_none());
    assert!(fx.store.get_page("front-3.pdf").await.unwrap().is_some());
}

#[tokio::test]
async fn test_default_nav_button_survives() {
    let fx = Fixture::new().await;
    fx.image("navButton.png").await;
    fx.image("stray.png").await;

    let config = ScrubberConfig {
        default_nav_button_name: Some("navButton.png".into()),
        ..ScrubberConfig::default()
    };
    let report = fx.scrubber(config).scrub().await.unwrap();

    assert_eq!(report.images.deleted, 1);
    assert_eq!(report.images.retained, 1);
    assert!(fx.store.get_image("navButton.png").await.unwrap().is_some());
    assert!(fx.store.get_file("navButton.png").await.unwrap().is_some());
    assert!(fx.store.get_image("stray.png").await.unwrap().is_none());
}

#[tokio::test]
async fn test_audio_of_bookmarked_article_is_kept() {
    let fx = Fixture::new().await;
    fx.audio("read-aloud.mp3").await;
    let mut article = fx.article("saved.html", true).await;
    article.audio = Some("read-aloud.mp3".into());
    fx.store.save_article(&article).await.unwrap();

    let report = fx.scrubber(ScrubberConfig::default()).scrub().await.unwrap();

    assert_eq!(report.articles.retained, 1);
    assert_eq!(report.audios.deleted, 0);
    assert!(fx.store.get_audio("read-aloud.mp3").await.unwrap().is_some());
}

#[tokio::test]
async fn test_bytes_removed_only_for_stored_files() {
    let fx = Fixture::new().await;
    let stored = fx.stored_file("stored.pdf").await;

    // bytes lying around for a file the store never materialized
    fx.file("ghost.pdf").await;
    let ghost = fx.root().join("ghost.pdf");
    write_bytes(&ghost);

    let report = fx.scrubber(ScrubberConfig::default()).scrub().await.unwrap();

    assert_eq!(report.files.deleted, 2);
    assert_eq!(report.disk_errors, 0);
    assert!(!stored.exists());
    assert!(ghost.exists());
}

#[tokio::test]
async fn test_missing_bytes_count_as_deleted() {
    let fx = Fixture::new().await;
    let path = fx.stored_file("gone.pdf").await;
    std::fs::remove_file(&path).unwrap();

    let report = fx.scrubber(ScrubberConfig::default()).scrub().await.unwrap();

    assert_eq!(report.files.deleted, 1);
    assert_eq!(report.disk_errors, 0);
    assert!(fx.store.get_file("gone.pdf").await.unwrap().is_none());
}

#[tokio::test]
async fn test_full_pass_clears_share_cache() {
    let fx = Fixture::new().await;
    let share = fx.temp.path().join("share");
    write_bytes(&share.join("article.pdf"));

    let config = ScrubberConfig {
        share_cache_dir: Some(share.clone()),
        ..ScrubberConfig::default()
    };
    let report = fx.scrubber(config).scrub().await.unwrap();

    assert!(report.share_cache_cleared);
    assert!(!share.exists());
}
