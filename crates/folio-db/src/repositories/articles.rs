//! Article and section queries.
//!
//! Both are composite: the entity row plus ordered join rows. Saves and
//! deletes touch all of them in one transaction.

use folio_core::{Article, RepositoryError, Section};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::row_mappers::{
    format_date, format_datetime, map_column_error, map_sqlx_error, parse_date, parse_datetime,
};

const ARTICLE_COLUMNS: &str =
    "file_name, issue_feed, issue_date, title, audio_file_name, bookmarked_time";
const SECTION_COLUMNS: &str = "file_name, issue_feed, issue_date, title, podcast_file_name";

/// Fetch an ordered list of names with a single bound key.
pub(super) async fn fetch_names(
    pool: &SqlitePool,
    sql: &str,
    key: &str,
) -> Result<Vec<String>, RepositoryError> {
    let rows = sqlx::query(sql)
        .bind(key)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;
    rows.iter()
        .map(|row| row.try_get::<String, _>(0).map_err(map_column_error))
        .collect()
}

// ---- articles ----

async fn load_article(pool: &SqlitePool, row: &SqliteRow) -> Result<Article, RepositoryError> {
    let file_name: String = row.try_get("file_name").map_err(map_column_error)?;
    let issue_date: String = row.try_get("issue_date").map_err(map_column_error)?;

    let images = fetch_names(
        pool,
        "SELECT image_file_name FROM article_image WHERE article_file_name = ? AND is_author = 0 ORDER BY position",
        &file_name,
    )
    .await?;
    let author_images = fetch_names(
        pool,
        "SELECT image_file_name FROM article_image WHERE article_file_name = ? AND is_author = 1 ORDER BY position",
        &file_name,
    )
    .await?;

    Ok(Article {
        issue_feed: row.try_get("issue_feed").map_err(map_column_error)?,
        issue_date: parse_date(&issue_date)?,
        title: row.try_get("title").map_err(map_column_error)?,
        audio: row.try_get("audio_file_name").map_err(map_column_error)?,
        images,
        author_images,
        bookmarked_time: parse_datetime(row.try_get("bookmarked_time").map_err(map_column_error)?)?,
        file_name,
    })
}

pub(super) async fn get_article(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<Article>, RepositoryError> {
    let row = sqlx::query(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM article WHERE file_name = ?"
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;

    match row {
        Some(row) => Ok(Some(load_article(pool, &row).await?)),
        None => Ok(None),
    }
}

pub(super) async fn save_article(pool: &SqlitePool, article: &Article) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::query(
        r#"
        INSERT INTO article (
            file_name, issue_feed, issue_date, title, audio_file_name, bookmarked_time
        ) VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(file_name) DO UPDATE SET
            issue_feed = excluded.issue_feed,
            issue_date = excluded.issue_date,
            title = excluded.title,
            audio_file_name = excluded.audio_file_name,
            bookmarked_time = excluded.bookmarked_time
        "#,
    )
    .bind(&article.file_name)
    .bind(&article.issue_feed)
    .bind(format_date(article.issue_date))
    .bind(&article.title)
    .bind(&article.audio)
    .bind(article.bookmarked_time.as_ref().map(format_datetime))
    .execute(&mut *tx)
    .await
    .map_err(map_sqlx_error)?;

    sqlx::query("DELETE FROM article_image WHERE article_file_name = ?")
        .bind(&article.file_name)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    let joins = article
        .images
        .iter()
        .enumerate()
        .map(|(pos, image)| (image, 0_i64, pos))
        .chain(
            article
                .author_images
                .iter()
                .enumerate()
                .map(|(pos, image)| (image, 1_i64, pos)),
        );
    for (image, is_author, position) in joins {
        sqlx::query(
            "INSERT OR IGNORE INTO article_image (article_file_name, image_file_name, is_author, position) VALUES (?, ?, ?, ?)",
        )
        .bind(&article.file_name)
        .bind(image)
        .bind(is_author)
        .bind(i64::try_from(position).unwrap_or(i64::MAX))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
    }

    tx.commit().await.map_err(map_sqlx_error)
}

pub(super) async fn delete_article(pool: &SqlitePool, name: &str) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::query("DELETE FROM article_image WHERE article_file_name = ?")
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    let result = sqlx::query("DELETE FROM article WHERE file_name = ?")
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("Article '{name}'")));
    }

    tx.commit().await.map_err(map_sqlx_error)
}

pub(super) async fn get_orphaned_articles(
    pool: &SqlitePool,
) -> Result<Vec<Article>, RepositoryError> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {ARTICLE_COLUMNS} FROM article a
        WHERE NOT EXISTS (SELECT 1 FROM section_article s WHERE s.article_file_name = a.file_name)
          AND NOT EXISTS (SELECT 1 FROM issue i WHERE i.imprint_file_name = a.file_name)
        ORDER BY file_name
        "#
    ))
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;

    let mut articles = Vec::with_capacity(rows.len());
    for row in &rows {
        articles.push(load_article(pool, row).await?);
    }
    Ok(articles)
}

// ---- sections ----

async fn load_section(pool: &SqlitePool, row: &SqliteRow) -> Result<Section, RepositoryError> {
    let file_name: String = row.try_get("file_name").map_err(map_column_error)?;
    let issue_date: String = row.try_get("issue_date").map_err(map_column_error)?;

    let articles = fetch_names(
        pool,
        "SELECT article_file_name FROM section_article WHERE section_file_name = ? ORDER BY position",
        &file_name,
    )
    .await?;
    let images = fetch_names(
        pool,
        "SELECT image_file_name FROM section_image WHERE section_file_name = ? ORDER BY position",
        &file_name,
    )
    .await?;

    Ok(Section {
        issue_feed: row.try_get("issue_feed").map_err(map_column_error)?,
        issue_date: parse_date(&issue_date)?,
        title: row.try_get("title").map_err(map_column_error)?,
        podcast: row.try_get("podcast_file_name").map_err(map_column_error)?,
        articles,
        images,
        file_name,
    })
}

pub(super) async fn get_section(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<Section>, RepositoryError> {
    let row = sqlx::query(&format!(
        "SELECT {SECTION_COLUMNS} FROM section WHERE file_name = ?"
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;

    match row {
        Some(row) => Ok(Some(load_section(pool, &row).await?)),
        None => Ok(None),
    }
}

pub(super) async fn save_section(pool: &SqlitePool, section: &Section) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::query(
        r#"
        INSERT INTO section (file_name, issue_feed, issue_date, title, podcast_file_name)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(file_name) DO UPDATE SET
            issue_feed = excluded.issue_feed,
            issue_date = excluded.issue_date,
            title = excluded.title,
            podcast_file_name = excluded.podcast_file_name
        "#,
    )
    .bind(&section.file_name)
    .bind(&section.issue_feed)
    .bind(format_date(section.issue_date))
    .bind(&section.title)
    .bind(&section.podcast)
    .execute(&mut *tx)
    .await
    .map_err(map_sqlx_error)?;

    sqlx::query("DELETE FROM section_article WHERE section_file_name = ?")
        .bind(&section.file_name)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
    sqlx::query("DELETE FROM section_image WHERE section_file_name = ?")
        .bind(&section.file_name)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    for (position, article) in section.articles.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO section_article (section_file_name, article_file_name, position) VALUES (?, ?, ?)",
        )
        .bind(&section.file_name)
        .bind(article)
        .bind(i64::try_from(position).unwrap_or(i64::MAX))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
    }
    for (position, image) in section.images.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO section_image (section_file_name, image_file_name, position) VALUES (?, ?, ?)",
        )
        .bind(&section.file_name)
        .bind(image)
        .bind(i64::try_from(position).unwrap_or(i64::MAX))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
    }

    tx.commit().await.map_err(map_sqlx_error)
}

pub(super) async fn delete_section(pool: &SqlitePool, name: &str) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    for sql in [
        "DELETE FROM section_article WHERE section_file_name = ?",
        "DELETE FROM section_image WHERE section_file_name = ?",
    ] {
        sqlx::query(sql)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    let result = sqlx::query("DELETE FROM section WHERE file_name = ?")
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("Section '{name}'")));
    }

    tx.commit().await.map_err(map_sqlx_error)
}

pub(super) async fn get_orphaned_sections(
    pool: &SqlitePool,
) -> Result<Vec<Section>, RepositoryError> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {SECTION_COLUMNS} FROM section s
        WHERE NOT EXISTS (SELECT 1 FROM issue_section i WHERE i.section_file_name = s.file_name)
        ORDER BY file_name
        "#
    ))
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;

    let mut sections = Vec::with_capacity(rows.len());
    for row in &rows {
        sections.push(load_section(pool, row).await?);
    }
    Ok(sections)
}
