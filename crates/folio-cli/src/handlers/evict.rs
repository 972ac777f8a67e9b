//! Evict command handler.

use tracing::warn;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Evict each named file; unknown names are reported and fail the command.
pub async fn execute(ctx: &CliContext, names: &[String]) -> Result<u64, CliError> {
    let mut freed = 0;
    let mut unknown = Vec::new();

    for name in names {
        let Some(entry) = ctx.store.get_file(name).await? else {
            warn!(target: "folio.cli", file = %name, "no such file");
            unknown.push(name.as_str());
            continue;
        };
        let bytes = ctx.storage.evict(&entry).await?;
        println!("evicted {name} ({bytes} bytes)");
        freed += bytes;
    }

    println!("{freed} bytes freed");
    if unknown.is_empty() {
        Ok(freed)
    } else {
        Err(CliError::Arguments(format!("unknown files: {}", unknown.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use folio_core::{FileEntry, Settings, StorageLocation, StorageRoots};
    use folio_db::StoreFactory;

    use super::*;
    use crate::bootstrap::bootstrap_with;

    #[tokio::test]
    async fn test_evict_removes_bytes_and_resets_entry() {
        let temp = tempfile::tempdir().unwrap();
        let store = StoreFactory::open_in_memory().await.unwrap();
        let ctx = bootstrap_with(
            Settings::with_defaults(),
            store,
            StorageRoots::new(temp.path().join("files")),
        );

        let entry = FileEntry::new("a.pdf", "issue", 1);
        ctx.store.save_file(&entry).await.unwrap();
        ctx.store
            .mark_download("a.pdf", Some(Utc::now()), StorageLocation::Internal)
            .await
            .unwrap();
        let path = temp.path().join("files/issue/a.pdf");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"12345678").unwrap();

        let freed = execute(&ctx, &["a.pdf".to_string()]).await.unwrap();

        assert_eq!(freed, 8);
        assert!(!path.exists());
        let stored = ctx.store.get_file("a.pdf").await.unwrap().unwrap();
        assert!(!stored.is_downloaded());
        assert_eq!(stored.storage_location, StorageLocation::NotStored);
    }

    #[tokio::test]
    async fn test_unknown_names_fail_the_command() {
        let temp = tempfile::tempdir().unwrap();
        let store = StoreFactory::open_in_memory().await.unwrap();
        let ctx = bootstrap_with(
            Settings::with_defaults(),
            store,
            StorageRoots::new(temp.path().join("files")),
        );

        let result = execute(&ctx, &["ghost.png".to_string()]).await;
        assert!(matches!(result, Err(CliError::Arguments(msg)) if msg.contains("ghost.png")));
    }
}
