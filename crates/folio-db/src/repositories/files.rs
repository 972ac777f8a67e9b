//! File entry queries.

use chrono::{DateTime, Utc};
use folio_core::{FileEntry, RepositoryError, StorageLocation};
use sqlx::SqlitePool;

use super::row_mappers::{FILE_SELECT_COLUMNS, format_datetime, map_sqlx_error, row_to_file_entry};

pub(super) async fn get_file(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<FileEntry>, RepositoryError> {
    let row = sqlx::query(&format!(
        "SELECT {FILE_SELECT_COLUMNS} FROM file_entry WHERE name = ?"
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_error)?;

    row.as_ref().map(row_to_file_entry).transpose()
}

/// Last write wins by `mo_time`; download date and storage location are
/// only overwritten by values that carry them.
pub(super) async fn save_file(pool: &SqlitePool, entry: &FileEntry) -> Result<(), RepositoryError> {
    let size = entry.size.and_then(|s| i64::try_from(s).ok());

    sqlx::query(
        r#"
        INSERT INTO file_entry (
            name, storage_type, mo_time, sha256, size, folder,
            date_download, storage_location
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            storage_type = excluded.storage_type,
            mo_time = excluded.mo_time,
            sha256 = excluded.sha256,
            size = excluded.size,
            folder = excluded.folder,
            date_download = COALESCE(excluded.date_download, file_entry.date_download),
            storage_location = CASE
                WHEN excluded.storage_location = 'not_stored' THEN file_entry.storage_location
                ELSE excluded.storage_location
            END
        WHERE excluded.mo_time >= file_entry.mo_time
        "#,
    )
    .bind(&entry.name)
    .bind(entry.storage_type.as_str())
    .bind(entry.mo_time)
    .bind(&entry.sha256)
    .bind(size)
    .bind(&entry.folder)
    .bind(entry.date_download.as_ref().map(format_datetime))
    .bind(entry.storage_location.as_str())
    .execute(pool)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

pub(super) async fn delete_file(pool: &SqlitePool, name: &str) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM file_entry WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("File '{name}'")));
    }
    Ok(())
}

pub(super) async fn mark_download(
    pool: &SqlitePool,
    name: &str,
    date: Option<DateTime<Utc>>,
    location: StorageLocation,
) -> Result<(), RepositoryError> {
    let result =
        sqlx::query("UPDATE file_entry SET date_download = ?, storage_location = ? WHERE name = ?")
            .bind(date.as_ref().map(format_datetime))
            .bind(location.as_str())
            .bind(name)
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("File '{name}'")));
    }
    Ok(())
}

pub(super) async fn get_orphaned_files(
    pool: &SqlitePool,
) -> Result<Vec<FileEntry>, RepositoryError> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {FILE_SELECT_COLUMNS} FROM file_entry f
        WHERE NOT EXISTS (SELECT 1 FROM image WHERE image.file_name = f.name)
          AND NOT EXISTS (SELECT 1 FROM audio WHERE audio.file_name = f.name)
          AND NOT EXISTS (SELECT 1 FROM page WHERE page.file_name = f.name)
          AND NOT EXISTS (SELECT 1 FROM article WHERE article.file_name = f.name)
          AND NOT EXISTS (SELECT 1 FROM section WHERE section.file_name = f.name)
          AND NOT EXISTS (SELECT 1 FROM moment_file m WHERE m.file_name = f.name)
          AND NOT EXISTS (SELECT 1 FROM resource_info_file r WHERE r.file_name = f.name)
        ORDER BY f.name
        "#
    ))
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;

    rows.iter().map(row_to_file_entry).collect()
}
