//! Database setup and initialization.
//!
//! This module provides the `setup_database()` function for initializing
//! the `SQLite` database with full schema. Entry points call this with the
//! resolved database path.

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::path::Path;

/// Sets up the `SQLite` database connection and ensures the schema exists.
///
/// Foreign key enforcement is switched on for every pooled connection.
///
/// # Example
///
/// ```rust,no_run
/// use folio_db::setup_database;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let pool = setup_database(Path::new("/path/to/folio.db")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn setup_database(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true),
    )
    .await?;

    create_schema(&pool).await?;
    tracing::debug!(target: "folio.db", path = %db_path.display(), "database ready");

    Ok(pool)
}

/// Sets up an in-memory `SQLite` database for testing.
///
/// The pool holds a single connection that is never recycled, since every
/// new in-memory connection would see an empty database.
#[cfg(any(test, feature = "test-utils"))]
pub async fn setup_test_database() -> Result<SqlitePool> {
    use sqlx::sqlite::SqlitePoolOptions;
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Creates the complete database schema.
///
/// Safe to call multiple times as all statements use IF NOT EXISTS.
async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Files are the leaves everything else points at
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS file_entry (
            name TEXT PRIMARY KEY NOT NULL,
            storage_type TEXT NOT NULL,
            mo_time INTEGER NOT NULL,
            sha256 TEXT,
            size INTEGER,
            folder TEXT NOT NULL,
            date_download TEXT,
            storage_location TEXT NOT NULL DEFAULT 'not_stored'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS image (
            file_name TEXT PRIMARY KEY NOT NULL REFERENCES file_entry(name),
            alpha REAL NOT NULL DEFAULT 1.0,
            resolution TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audio (
            file_name TEXT PRIMARY KEY NOT NULL REFERENCES file_entry(name),
            playtime INTEGER,
            speaker TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS page (
            file_name TEXT PRIMARY KEY NOT NULL REFERENCES file_entry(name),
            title TEXT,
            pagina TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS article (
            file_name TEXT PRIMARY KEY NOT NULL REFERENCES file_entry(name),
            issue_feed TEXT NOT NULL,
            issue_date TEXT NOT NULL,
            title TEXT,
            audio_file_name TEXT REFERENCES audio(file_name),
            bookmarked_time TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Article images; `is_author` separates author portraits from content images
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS article_image (
            article_file_name TEXT NOT NULL REFERENCES article(file_name),
            image_file_name TEXT NOT NULL REFERENCES image(file_name),
            is_author INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL,
            PRIMARY KEY (article_file_name, image_file_name, is_author)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS section (
            file_name TEXT PRIMARY KEY NOT NULL REFERENCES file_entry(name),
            issue_feed TEXT NOT NULL,
            issue_date TEXT NOT NULL,
            title TEXT,
            podcast_file_name TEXT REFERENCES audio(file_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS section_article (
            section_file_name TEXT NOT NULL REFERENCES section(file_name),
            article_file_name TEXT NOT NULL REFERENCES article(file_name),
            position INTEGER NOT NULL,
            PRIMARY KEY (section_file_name, article_file_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS section_image (
            section_file_name TEXT NOT NULL REFERENCES section(file_name),
            image_file_name TEXT NOT NULL REFERENCES image(file_name),
            position INTEGER NOT NULL,
            PRIMARY KEY (section_file_name, image_file_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Moments and front pages are keyed by issue key but do not reference
    // the issue row: they outlive their issue and are retained by recency
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS moment (
            issue_feed TEXT NOT NULL,
            issue_date TEXT NOT NULL,
            issue_status TEXT NOT NULL,
            PRIMARY KEY (issue_feed, issue_date, issue_status)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS moment_image (
            issue_feed TEXT NOT NULL,
            issue_date TEXT NOT NULL,
            issue_status TEXT NOT NULL,
            image_file_name TEXT NOT NULL REFERENCES image(file_name),
            is_credit INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL,
            PRIMARY KEY (issue_feed, issue_date, issue_status, image_file_name, is_credit),
            FOREIGN KEY (issue_feed, issue_date, issue_status)
                REFERENCES moment(issue_feed, issue_date, issue_status)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS moment_file (
            issue_feed TEXT NOT NULL,
            issue_date TEXT NOT NULL,
            issue_status TEXT NOT NULL,
            file_name TEXT NOT NULL REFERENCES file_entry(name),
            position INTEGER NOT NULL,
            PRIMARY KEY (issue_feed, issue_date, issue_status, file_name),
            FOREIGN KEY (issue_feed, issue_date, issue_status)
                REFERENCES moment(issue_feed, issue_date, issue_status)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS front_page (
            issue_feed TEXT NOT NULL,
            issue_date TEXT NOT NULL,
            issue_status TEXT NOT NULL,
            page_file_name TEXT NOT NULL REFERENCES page(file_name),
            PRIMARY KEY (issue_feed, issue_date, issue_status)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resource_info (
            version INTEGER PRIMARY KEY NOT NULL,
            date_download TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resource_info_file (
            version INTEGER NOT NULL REFERENCES resource_info(version),
            file_name TEXT NOT NULL REFERENCES file_entry(name),
            position INTEGER NOT NULL,
            PRIMARY KEY (version, file_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS issue (
            feed TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            imprint_file_name TEXT REFERENCES article(file_name),
            PRIMARY KEY (feed, date, status)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS issue_section (
            feed TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            section_file_name TEXT NOT NULL REFERENCES section(file_name),
            position INTEGER NOT NULL,
            PRIMARY KEY (feed, date, status, section_file_name),
            FOREIGN KEY (feed, date, status) REFERENCES issue(feed, date, status)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS issue_page (
            feed TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            page_file_name TEXT NOT NULL REFERENCES page(file_name),
            position INTEGER NOT NULL,
            PRIMARY KEY (feed, date, status, page_file_name),
            FOREIGN KEY (feed, date, status) REFERENCES issue(feed, date, status)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Reverse lookups used by the orphan queries
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_article_image_image ON article_image(image_file_name)",
        "CREATE INDEX IF NOT EXISTS idx_section_article_article ON section_article(article_file_name)",
        "CREATE INDEX IF NOT EXISTS idx_section_image_image ON section_image(image_file_name)",
        "CREATE INDEX IF NOT EXISTS idx_moment_image_image ON moment_image(image_file_name)",
        "CREATE INDEX IF NOT EXISTS idx_moment_file_file ON moment_file(file_name)",
        "CREATE INDEX IF NOT EXISTS idx_resource_info_file_file ON resource_info_file(file_name)",
        "CREATE INDEX IF NOT EXISTS idx_issue_section_section ON issue_section(section_file_name)",
        "CREATE INDEX IF NOT EXISTS idx_issue_page_page ON issue_page(page_file_name)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = setup_test_database().await.unwrap();
        create_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = setup_test_database().await.unwrap();
        let row = sqlx::query("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        let enabled: i64 = row.get(0);
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_setup_database_creates_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/folio.db");
        let pool = setup_database(&path).await.unwrap();
        pool.close().await;
        assert!(path.exists());
    }
}
