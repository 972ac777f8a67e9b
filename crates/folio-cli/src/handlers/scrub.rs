//! Scrub command handler.

use folio_core::{PhaseStats, ScrubReport};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Run a scrub pass and print the report.
pub async fn execute(ctx: &CliContext, minimal: bool, json: bool) -> Result<(), CliError> {
    let report = if minimal {
        ctx.scrubber.scrub_minimal().await
    } else {
        ctx.scrubber.scrub().await?
    };

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Io(format!("Could not encode report: {e}")))?;
        println!("{rendered}");
    } else {
        println!("{}", render(&report));
    }
    Ok(())
}

/// Human-readable report, one phase per line.
pub fn render(report: &ScrubReport) -> String {
    let phases: [(&str, PhaseStats); 9] = [
        ("sections", report.sections),
        ("moments", report.moments),
        ("front pages", report.front_pages),
        ("pages", report.pages),
        ("articles", report.articles),
        ("resource infos", report.resource_infos),
        ("images", report.images),
        ("audios", report.audios),
        ("files", report.files),
    ];

    let mut lines: Vec<String> = phases
        .iter()
        .filter(|(_, stats)| stats.deleted > 0 || stats.retained > 0)
        .map(|(name, stats)| {
            format!("{name:<15} deleted {:>5}  retained {:>5}", stats.deleted, stats.retained)
        })
        .collect();
    if lines.is_empty() {
        lines.push("nothing to scrub".to_string());
    }
    lines.push(format!(
        "{} rows deleted, {} bytes reclaimed",
        report.total_deleted(),
        report.bytes_reclaimed
    ));
    if report.disk_errors > 0 {
        lines.push(format!("{} files could not be removed from disk", report.disk_errors));
    }
    if report.share_cache_cleared {
        lines.push("share cache cleared".to_string());
    }
    lines.join("\n")
}
