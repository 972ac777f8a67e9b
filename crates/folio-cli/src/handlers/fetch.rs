//! Fetch command handler.
//!
//! Registers unknown file names, plans one download per name under the
//! preferred storage root and runs them as a single operation.

use std::sync::Arc;

use chrono::Utc;
use folio_core::{DownloadItem, DownloadPriority, FileEntry, OperationEvent, OperationSummary};
use folio_download::{DownloadEngine, DownloadOperation};
use tracing::debug;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Arguments for the fetch command.
#[derive(Debug, Clone)]
pub struct FetchArgs<'a> {
    pub base_url: &'a str,
    pub folder: &'a str,
    pub high: bool,
    pub names: &'a [String],
}

/// Execute the fetch command over reqwest.
pub async fn execute(ctx: &CliContext, args: FetchArgs<'_>) -> Result<(), CliError> {
    let engine = ctx.download_engine(args.base_url)?;
    let summary = fetch_with(ctx, &engine, &args).await?;
    if summary.is_success() {
        Ok(())
    } else {
        Err(CliError::Downloads {
            failed: summary.failed,
            total: summary.total,
        })
    }
}

/// Run a fetch on `engine`, printing one line per file.
pub async fn fetch_with(
    ctx: &CliContext,
    engine: &Arc<DownloadEngine>,
    args: &FetchArgs<'_>,
) -> Result<OperationSummary, CliError> {
    let items = plan(ctx, args).await?;
    let operation = Arc::new(DownloadOperation::new("fetch", items));
    let mut events = operation.subscribe();

    let summary = engine.download(Arc::clone(&operation)).await;

    while let Ok(event) = events.try_recv() {
        match event {
            OperationEvent::ItemSucceeded { key } => println!("✓ {key}"),
            OperationEvent::ItemFailed { key, error } => println!("✗ {key}: {error}"),
            OperationEvent::WaitingForConnection => println!("… waiting for connection"),
            OperationEvent::Started { .. } | OperationEvent::Completed(_) => {}
        }
    }
    println!("{} of {} files downloaded", summary.succeeded, summary.total);
    Ok(summary)
}

/// Look up or register each name and turn it into a download item.
pub async fn plan(ctx: &CliContext, args: &FetchArgs<'_>) -> Result<Vec<DownloadItem>, CliError> {
    if args.base_url.trim().is_empty() {
        return Err(CliError::Arguments("base URL must not be empty".into()));
    }

    let roots = ctx.roots();
    let location = roots.preferred_location();
    let root = roots
        .dir_for(location)
        .ok_or_else(|| CliError::Config(format!("No storage root for {location}")))?;
    let priority = if args.high {
        DownloadPriority::High
    } else {
        DownloadPriority::Normal
    };

    let mut items = Vec::with_capacity(args.names.len());
    for name in args.names {
        let entry = match ctx.store.get_file(name).await? {
            Some(entry) => entry,
            None => {
                let entry = FileEntry::new(name.as_str(), args.folder, Utc::now().timestamp());
                ctx.store.save_file(&entry).await?;
                debug!(target: "folio.cli", file = %name, folder = args.folder, "registered file");
                entry
            }
        };
        items.push(DownloadItem::for_file(
            &entry,
            args.base_url,
            root,
            location,
            priority,
        ));
    }
    Ok(items)
}
