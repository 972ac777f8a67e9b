//! Issue-level queries: issues, moments, front pages and resource bundles.

use folio_core::{FrontPage, Issue, IssueKey, Moment, RepositoryError, ResourceInfo};
use sqlx::{Row, SqlitePool};

use super::row_mappers::{
    format_date, format_datetime, map_column_error, map_sqlx_error, parse_datetime,
    row_to_issue_key,
};

fn position(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

// ---- moments ----

async fn load_moment(pool: &SqlitePool, key: IssueKey) -> Result<Moment, RepositoryError> {
    let date = format_date(key.date);
    let children = |sql: &'static str| {
        let date = date.clone();
        let feed = key.feed.clone();
        let status = key.status.as_str();
        async move {
            let rows = sqlx::query(sql)
                .bind(feed)
                .bind(date)
                .bind(status)
                .fetch_all(pool)
                .await
                .map_err(map_sqlx_error)?;
            rows.iter()
                .map(|row| row.try_get::<String, _>(0).map_err(map_column_error))
                .collect::<Result<Vec<_>, _>>()
        }
    };

    let images = children(
        "SELECT image_file_name FROM moment_image WHERE issue_feed = ? AND issue_date = ? AND issue_status = ? AND is_credit = 0 ORDER BY position",
    )
    .await?;
    let credits = children(
        "SELECT image_file_name FROM moment_image WHERE issue_feed = ? AND issue_date = ? AND issue_status = ? AND is_credit = 1 ORDER BY position",
    )
    .await?;
    let files = children(
        "SELECT file_name FROM moment_file WHERE issue_feed = ? AND issue_date = ? AND issue_status = ? ORDER BY position",
    )
    .await?;

    Ok(Moment {
        issue_key: key,
        images,
        credits,
        files,
    })
}

pub(super) async fn get_moment(
    pool: &SqlitePool,
    key: &IssueKey,
) -> Result<Option<Moment>, RepositoryError> {
    let exists = sqlx::query(
        "SELECT 1 FROM moment WHERE issue_feed = ? AND issue_date = ? AND issue_status = ?",
    )
    .bind(&key.feed)
    .bind(format_date(key.date))
    .bind(key.status.as_str())
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;

    match exists {
        Some(_) => Ok(Some(load_moment(pool, key.clone()).await?)),
        None => Ok(None),
    }
}

pub(super) async fn save_moment(pool: &SqlitePool, moment: &Moment) -> Result<(), RepositoryError> {
    let key = &moment.issue_key;
    let date = format_date(key.date);
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::query(
        "INSERT OR IGNORE INTO moment (issue_feed, issue_date, issue_status) VALUES (?, ?, ?)",
    )
    .bind(&key.feed)
    .bind(&date)
    .bind(key.status.as_str())
    .execute(&mut *tx)
    .await
    .map_err(map_sqlx_error)?;

    for sql in [
        "DELETE FROM moment_image WHERE issue_feed = ? AND issue_date = ? AND issue_status = ?",
        "DELETE FROM moment_file WHERE issue_feed = ? AND issue_date = ? AND issue_status = ?",
    ] {
        sqlx::query(sql)
            .bind(&key.feed)
            .bind(&date)
            .bind(key.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    let images = moment
        .images
        .iter()
        .enumerate()
        .map(|(i, name)| (name, 0_i64, i))
        .chain(moment.credits.iter().enumerate().map(|(i, name)| (name, 1_i64, i)));
    for (image, is_credit, index) in images {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO moment_image (
                issue_feed, issue_date, issue_status, image_file_name, is_credit, position
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&key.feed)
        .bind(&date)
        .bind(key.status.as_str())
        .bind(image)
        .bind(is_credit)
        .bind(position(index))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
    }

    for (index, file) in moment.files.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO moment_file (
                issue_feed, issue_date, issue_status, file_name, position
            ) VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&key.feed)
        .bind(&date)
        .bind(key.status.as_str())
        .bind(file)
        .bind(position(index))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
    }

    tx.commit().await.map_err(map_sqlx_error)
}

pub(super) async fn delete_moment(pool: &SqlitePool, key: &IssueKey) -> Result<(), RepositoryError> {
    let date = format_date(key.date);
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    for sql in [
        "DELETE FROM moment_image WHERE issue_feed = ? AND issue_date = ? AND issue_status = ?",
        "DELETE FROM moment_file WHERE issue_feed = ? AND issue_date = ? AND issue_status = ?",
    ] {
        sqlx::query(sql)
            .bind(&key.feed)
            .bind(&date)
            .bind(key.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    let result = sqlx::query(
        "DELETE FROM moment WHERE issue_feed = ? AND issue_date = ? AND issue_status = ?",
    )
    .bind(&key.feed)
    .bind(&date)
    .bind(key.status.as_str())
    .execute(&mut *tx)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("Moment '{key}'")));
    }

    tx.commit().await.map_err(map_sqlx_error)
}

pub(super) async fn get_orphaned_moments(pool: &SqlitePool) -> Result<Vec<Moment>, RepositoryError> {
    let rows = sqlx::query(
        r#"
        SELECT issue_feed, issue_date, issue_status FROM moment m
        WHERE NOT EXISTS (
            SELECT 1 FROM issue i
            WHERE i.feed = m.issue_feed AND i.date = m.issue_date AND i.status = m.issue_status
        )
        ORDER BY issue_date DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;

    let keys = rows
        .iter()
        .map(|row| row_to_issue_key(row, "issue_feed", "issue_date", "issue_status"))
        .collect::<Result<Vec<_>, _>>()?;

    let mut moments = Vec::with_capacity(keys.len());
    for key in keys {
        moments.push(load_moment(pool, key).await?);
    }
    Ok(moments)
}

// ---- front pages ----

pub(super) async fn save_front_page(
    pool: &SqlitePool,
    front_page: &FrontPage,
) -> Result<(), RepositoryError> {
    let key = &front_page.issue_key;
    sqlx::query(
        r#"
        INSERT INTO front_page (issue_feed, issue_date, issue_status, page_file_name)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(issue_feed, issue_date, issue_status) DO UPDATE SET
            page_file_name = excluded.page_file_name
        "#,
    )
    .bind(&key.feed)
    .bind(format_date(key.date))
    .bind(key.status.as_str())
    .bind(&front_page.page)
    .execute(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

pub(super) async fn delete_front_page(
    pool: &SqlitePool,
    front_page: &FrontPage,
) -> Result<(), RepositoryError> {
    let key = &front_page.issue_key;
    let result = sqlx::query(
        r#"
        DELETE FROM front_page
        WHERE issue_feed = ? AND issue_date = ? AND issue_status = ? AND page_file_name = ?
        "#,
    )
    .bind(&key.feed)
    .bind(format_date(key.date))
    .bind(key.status.as_str())
    .bind(&front_page.page)
    .execute(pool)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("Front page of '{key}'")));
    }
    Ok(())
}

pub(super) async fn get_orphaned_front_pages(
    pool: &SqlitePool,
) -> Result<Vec<FrontPage>, RepositoryError> {
    let rows = sqlx::query(
        r#"
        SELECT issue_feed, issue_date, issue_status, page_file_name FROM front_page f
        WHERE NOT EXISTS (
            SELECT 1 FROM issue i
            WHERE i.feed = f.issue_feed AND i.date = f.issue_date AND i.status = f.issue_status
        )
        ORDER BY issue_date DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;

    rows.iter()
        .map(|row| {
            Ok(FrontPage {
                issue_key: row_to_issue_key(row, "issue_feed", "issue_date", "issue_status")?,
                page: row.try_get("page_file_name").map_err(map_column_error)?,
            })
        })
        .collect()
}

// ---- resource bundles ----

async fn load_resource_info(
    pool: &SqlitePool,
    version: i64,
    date_download: Option<String>,
) -> Result<ResourceInfo, RepositoryError> {
    let rows = sqlx::query(
        "SELECT file_name FROM resource_info_file WHERE version = ? ORDER BY position",
    )
    .bind(version)
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;

    let files = rows
        .iter()
        .map(|row| row.try_get::<String, _>(0).map_err(map_column_error))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResourceInfo {
        version,
        files,
        date_download: parse_datetime(date_download)?,
    })
}

pub(super) async fn get_resource_info(
    pool: &SqlitePool,
    version: i64,
) -> Result<Option<ResourceInfo>, RepositoryError> {
    let row = sqlx::query("SELECT version, date_download FROM resource_info WHERE version = ?")
        .bind(version)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;

    match row {
        Some(row) => {
            let date: Option<String> = row.try_get("date_download").map_err(map_column_error)?;
            Ok(Some(load_resource_info(pool, version, date).await?))
        }
        None => Ok(None),
    }
}

pub(super) async fn save_resource_info(
    pool: &SqlitePool,
    info: &ResourceInfo,
) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::query(
        r#"
        INSERT INTO resource_info (version, date_download) VALUES (?, ?)
        ON CONFLICT(version) DO UPDATE SET
            date_download = COALESCE(excluded.date_download, resource_info.date_download)
        "#,
    )
    .bind(info.version)
    .bind(info.date_download.as_ref().map(format_datetime))
    .execute(&mut *tx)
    .await
    .map_err(map_sqlx_error)?;

    sqlx::query("DELETE FROM resource_info_file WHERE version = ?")
        .bind(info.version)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    for (index, file) in info.files.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO resource_info_file (version, file_name, position) VALUES (?, ?, ?)",
        )
        .bind(info.version)
        .bind(file)
        .bind(position(index))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
    }

    tx.commit().await.map_err(map_sqlx_error)
}

pub(super) async fn delete_resource_info(
    pool: &SqlitePool,
    version: i64,
) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::query("DELETE FROM resource_info_file WHERE version = ?")
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    let result = sqlx::query("DELETE FROM resource_info WHERE version = ?")
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("Resource info v{version}")));
    }

    tx.commit().await.map_err(map_sqlx_error)
}

pub(super) async fn get_orphaned_resource_infos(
    pool: &SqlitePool,
) -> Result<Vec<ResourceInfo>, RepositoryError> {
    let rows = sqlx::query("SELECT version, date_download FROM resource_info ORDER BY version")
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;

    let mut infos = Vec::with_capacity(rows.len());
    for row in &rows {
        let version: i64 = row.try_get("version").map_err(map_column_error)?;
        let date: Option<String> = row.try_get("date_download").map_err(map_column_error)?;
        infos.push(load_resource_info(pool, version, date).await?);
    }
    Ok(infos)
}

// ---- issues ----

pub(super) async fn get_issue(
    pool: &SqlitePool,
    key: &IssueKey,
) -> Result<Option<Issue>, RepositoryError> {
    let date = format_date(key.date);
    let row = sqlx::query(
        "SELECT imprint_file_name FROM issue WHERE feed = ? AND date = ? AND status = ?",
    )
    .bind(&key.feed)
    .bind(&date)
    .bind(key.status.as_str())
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;

    let Some(row) = row else {
        return Ok(None);
    };
    let imprint: Option<String> = row.try_get("imprint_file_name").map_err(map_column_error)?;

    let scoped = |sql: &'static str| {
        let feed = key.feed.clone();
        let date = date.clone();
        let status = key.status.as_str();
        async move {
            let rows = sqlx::query(sql)
                .bind(feed)
                .bind(date)
                .bind(status)
                .fetch_all(pool)
                .await
                .map_err(map_sqlx_error)?;
            rows.iter()
                .map(|row| row.try_get::<String, _>(0).map_err(map_column_error))
                .collect::<Result<Vec<_>, _>>()
        }
    };

    let sections = scoped(
        "SELECT section_file_name FROM issue_section WHERE feed = ? AND date = ? AND status = ? ORDER BY position",
    )
    .await?;
    let pages = scoped(
        "SELECT page_file_name FROM issue_page WHERE feed = ? AND date = ? AND status = ? ORDER BY position",
    )
    .await?;

    Ok(Some(Issue {
        key: key.clone(),
        sections,
        pages,
        imprint,
    }))
}

pub(super) async fn save_issue(pool: &SqlitePool, issue: &Issue) -> Result<(), RepositoryError> {
    let key = &issue.key;
    let date = format_date(key.date);
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::query(
        r#"
        INSERT INTO issue (feed, date, status, imprint_file_name) VALUES (?, ?, ?, ?)
        ON CONFLICT(feed, date, status) DO UPDATE SET
            imprint_file_name = excluded.imprint_file_name
        "#,
    )
    .bind(&key.feed)
    .bind(&date)
    .bind(key.status.as_str())
    .bind(&issue.imprint)
    .execute(&mut *tx)
    .await
    .map_err(map_sqlx_error)?;

    for sql in [
        "DELETE FROM issue_section WHERE feed = ? AND date = ? AND status = ?",
        "DELETE FROM issue_page WHERE feed = ? AND date = ? AND status = ?",
    ] {
        sqlx::query(sql)
            .bind(&key.feed)
            .bind(&date)
            .bind(key.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    for (index, section) in issue.sections.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO issue_section (feed, date, status, section_file_name, position) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&key.feed)
        .bind(&date)
        .bind(key.status.as_str())
        .bind(section)
        .bind(position(index))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
    }
    for (index, page) in issue.pages.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO issue_page (feed, date, status, page_file_name, position) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&key.feed)
        .bind(&date)
        .bind(key.status.as_str())
        .bind(page)
        .bind(position(index))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
    }

    tx.commit().await.map_err(map_sqlx_error)
}

pub(super) async fn delete_issue(pool: &SqlitePool, key: &IssueKey) -> Result<(), RepositoryError> {
    let date = format_date(key.date);
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    for sql in [
        "DELETE FROM issue_section WHERE feed = ? AND date = ? AND status = ?",
        "DELETE FROM issue_page WHERE feed = ? AND date = ? AND status = ?",
    ] {
        sqlx::query(sql)
            .bind(&key.feed)
            .bind(&date)
            .bind(key.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    let result = sqlx::query("DELETE FROM issue WHERE feed = ? AND date = ? AND status = ?")
        .bind(&key.feed)
        .bind(&date)
        .bind(key.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("Issue '{key}'")));
    }

    tx.commit().await.map_err(map_sqlx_error)
}
