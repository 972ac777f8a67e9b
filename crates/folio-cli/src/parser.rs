//! Root CLI parser and global options.

use clap::Parser;

use crate::commands::Commands;

/// Offline content cache for a periodical reader.
#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Download, track and scrub cached periodical content")]
#[command(version)]
pub struct Cli {
    /// Override the data directory for this invocation
    #[arg(long = "data-dir", global = true, env = "FOLIO_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Log debug output from the folio crates
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
