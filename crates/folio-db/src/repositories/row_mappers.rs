//! Row mapping helpers for `SQLite` queries.

use chrono::{DateTime, NaiveDate, Utc};
use folio_core::{FileEntry, IssueKey, IssueStatus, RepositoryError, StorageLocation, StorageType};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Shared SELECT column list for file entry queries.
pub const FILE_SELECT_COLUMNS: &str =
    "name, storage_type, mo_time, sha256, size, folder, date_download, storage_location";

/// Map a `sqlx` error, surfacing foreign key failures as constraint violations.
pub fn map_sqlx_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_foreign_key_violation() || db.message().contains("FOREIGN KEY constraint failed")
        {
            return RepositoryError::Constraint(db.message().to_string());
        }
    }
    RepositoryError::Storage(e.to_string())
}

pub fn map_column_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(format!("Column read error: {e}"))
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse an RFC 3339 timestamp column.
pub fn parse_datetime(value: Option<String>) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| RepositoryError::Serialization(format!("bad timestamp '{s}': {e}")))
        })
        .transpose()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| RepositoryError::Serialization(format!("bad date '{value}': {e}")))
}

/// Read an issue key stored in the given three columns.
pub fn row_to_issue_key(
    row: &SqliteRow,
    feed_col: &str,
    date_col: &str,
    status_col: &str,
) -> Result<IssueKey, RepositoryError> {
    let feed: String = row.try_get(feed_col).map_err(map_column_error)?;
    let date: String = row.try_get(date_col).map_err(map_column_error)?;
    let status: String = row.try_get(status_col).map_err(map_column_error)?;
    Ok(IssueKey {
        feed,
        date: parse_date(&date)?,
        status: status
            .parse::<IssueStatus>()
            .map_err(RepositoryError::Serialization)?,
    })
}

/// Convert a database row to a `FileEntry`.
pub fn row_to_file_entry(row: &SqliteRow) -> Result<FileEntry, RepositoryError> {
    let storage_type: String = row.try_get("storage_type").map_err(map_column_error)?;
    let storage_location: String = row.try_get("storage_location").map_err(map_column_error)?;
    let size: Option<i64> = row.try_get("size").map_err(map_column_error)?;

    Ok(FileEntry {
        name: row.try_get("name").map_err(map_column_error)?,
        storage_type: storage_type
            .parse::<StorageType>()
            .map_err(RepositoryError::Serialization)?,
        mo_time: row.try_get("mo_time").map_err(map_column_error)?,
        sha256: row.try_get("sha256").map_err(map_column_error)?,
        size: size.and_then(|s| u64::try_from(s).ok()),
        folder: row.try_get("folder").map_err(map_column_error)?,
        date_download: parse_datetime(row.try_get("date_download").map_err(map_column_error)?)?,
        storage_location: storage_location
            .parse::<StorageLocation>()
            .map_err(RepositoryError::Serialization)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_roundtrip() {
        let now = Utc::now();
        let parsed = parse_datetime(Some(format_datetime(&now))).unwrap().unwrap();
        assert_eq!(parsed, now);
    }

    #[test]
    fn test_parse_datetime_none_and_garbage() {
        assert_eq!(parse_datetime(None).unwrap(), None);
        assert!(matches!(
            parse_datetime(Some("yesterday".into())),
            Err(RepositoryError::Serialization(_))
        ));
    }

    #[test]
    fn test_date_format() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
        assert_eq!(format_date(date), "2024-02-09");
        assert_eq!(parse_date("2024-02-09").unwrap(), date);
    }
}
