//! Image, audio and page queries.

use folio_core::{Audio, Image, ImageResolution, Page, RepositoryError};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::row_mappers::{map_column_error, map_sqlx_error};

// ---- images ----

fn row_to_image(row: &SqliteRow) -> Result<Image, RepositoryError> {
    let alpha: f64 = row.try_get("alpha").map_err(map_column_error)?;
    let resolution: String = row.try_get("resolution").map_err(map_column_error)?;
    #[allow(clippy::cast_possible_truncation)]
    let alpha = alpha as f32;
    Ok(Image {
        file_name: row.try_get("file_name").map_err(map_column_error)?,
        alpha,
        resolution: ImageResolution::parse(&resolution),
    })
}

pub(super) async fn get_image(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<Image>, RepositoryError> {
    let row = sqlx::query("SELECT file_name, alpha, resolution FROM image WHERE file_name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;
    row.as_ref().map(row_to_image).transpose()
}

pub(super) async fn save_image(pool: &SqlitePool, image: &Image) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO image (file_name, alpha, resolution) VALUES (?, ?, ?)
        ON CONFLICT(file_name) DO UPDATE SET
            alpha = excluded.alpha,
            resolution = excluded.resolution
        "#,
    )
    .bind(&image.file_name)
    .bind(f64::from(image.alpha))
    .bind(image.resolution.as_str())
    .execute(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

pub(super) async fn delete_image(pool: &SqlitePool, name: &str) -> Result<(), RepositoryError> {
    delete_by_name(pool, "DELETE FROM image WHERE file_name = ?", "Image", name).await
}

pub(super) async fn get_orphaned_images(pool: &SqlitePool) -> Result<Vec<Image>, RepositoryError> {
    let rows = sqlx::query(
        r#"
        SELECT file_name, alpha, resolution FROM image i
        WHERE NOT EXISTS (SELECT 1 FROM article_image a WHERE a.image_file_name = i.file_name)
          AND NOT EXISTS (SELECT 1 FROM section_image s WHERE s.image_file_name = i.file_name)
          AND NOT EXISTS (SELECT 1 FROM moment_image m WHERE m.image_file_name = i.file_name)
        ORDER BY file_name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;
    rows.iter().map(row_to_image).collect()
}

// ---- audio ----

fn row_to_audio(row: &SqliteRow) -> Result<Audio, RepositoryError> {
    let playtime: Option<i64> = row.try_get("playtime").map_err(map_column_error)?;
    Ok(Audio {
        file_name: row.try_get("file_name").map_err(map_column_error)?,
        playtime: playtime.and_then(|p| u32::try_from(p).ok()),
        speaker: row.try_get("speaker").map_err(map_column_error)?,
    })
}

pub(super) async fn get_audio(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<Audio>, RepositoryError> {
    let row = sqlx::query("SELECT file_name, playtime, speaker FROM audio WHERE file_name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;
    row.as_ref().map(row_to_audio).transpose()
}

pub(super) async fn save_audio(pool: &SqlitePool, audio: &Audio) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO audio (file_name, playtime, speaker) VALUES (?, ?, ?)
        ON CONFLICT(file_name) DO UPDATE SET
            playtime = excluded.playtime,
            speaker = excluded.speaker
        "#,
    )
    .bind(&audio.file_name)
    .bind(audio.playtime.map(i64::from))
    .bind(&audio.speaker)
    .execute(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

pub(super) async fn delete_audio(pool: &SqlitePool, name: &str) -> Result<(), RepositoryError> {
    delete_by_name(pool, "DELETE FROM audio WHERE file_name = ?", "Audio", name).await
}

pub(super) async fn get_orphaned_audios(pool: &SqlitePool) -> Result<Vec<Audio>, RepositoryError> {
    let rows = sqlx::query(
        r#"
        SELECT file_name, playtime, speaker FROM audio au
        WHERE NOT EXISTS (SELECT 1 FROM article a WHERE a.audio_file_name = au.file_name)
          AND NOT EXISTS (SELECT 1 FROM section s WHERE s.podcast_file_name = au.file_name)
        ORDER BY file_name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;
    rows.iter().map(row_to_audio).collect()
}

// ---- pages ----

fn row_to_page(row: &SqliteRow) -> Result<Page, RepositoryError> {
    Ok(Page {
        file_name: row.try_get("file_name").map_err(map_column_error)?,
        title: row.try_get("title").map_err(map_column_error)?,
        pagina: row.try_get("pagina").map_err(map_column_error)?,
    })
}

pub(super) async fn get_page(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<Page>, RepositoryError> {
    let row = sqlx::query("SELECT file_name, title, pagina FROM page WHERE file_name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_error)?;
    row.as_ref().map(row_to_page).transpose()
}

pub(super) async fn save_page(pool: &SqlitePool, page: &Page) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO page (file_name, title, pagina) VALUES (?, ?, ?)
        ON CONFLICT(file_name) DO UPDATE SET
            title = excluded.title,
            pagina = excluded.pagina
        "#,
    )
    .bind(&page.file_name)
    .bind(&page.title)
    .bind(&page.pagina)
    .execute(pool)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

pub(super) async fn delete_page(pool: &SqlitePool, name: &str) -> Result<(), RepositoryError> {
    delete_by_name(pool, "DELETE FROM page WHERE file_name = ?", "Page", name).await
}

pub(super) async fn get_orphaned_pages(pool: &SqlitePool) -> Result<Vec<Page>, RepositoryError> {
    let rows = sqlx::query(
        r#"
        SELECT file_name, title, pagina FROM page p
        WHERE NOT EXISTS (SELECT 1 FROM issue_page ip WHERE ip.page_file_name = p.file_name)
          AND NOT EXISTS (SELECT 1 FROM front_page fp WHERE fp.page_file_name = p.file_name)
        ORDER BY file_name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_error)?;
    rows.iter().map(row_to_page).collect()
}

async fn delete_by_name(
    pool: &SqlitePool,
    sql: &str,
    kind: &str,
    name: &str,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(sql)
        .bind(name)
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("{kind} '{name}'")));
    }
    Ok(())
}
