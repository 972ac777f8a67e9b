//! Subcommand definitions.

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show resolved data, database and storage paths
    Paths,

    /// Delete content no longer reachable from any issue or bookmark
    Scrub {
        /// Only clear the share cache
        #[arg(long)]
        minimal: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download files into storage, registering unknown names first
    Fetch {
        /// Base URL files are fetched from
        #[arg(long = "base-url", env = "FOLIO_CONTENT_BASE_URL")]
        base_url: String,
        /// Folder (relative path) for names not yet registered
        #[arg(long, default_value = "")]
        folder: String,
        /// Jump ahead of queued normal-priority downloads
        #[arg(long)]
        high: bool,
        /// File names to download
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Remove the bytes of downloaded files and mark them not stored
    Evict {
        /// File names to evict
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Run scheduled scrub passes until interrupted
    Daemon,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::Cli;

    #[test]
    fn test_fetch_args() {
        let cli = Cli::parse_from([
            "folio",
            "fetch",
            "--base-url",
            "https://cdn.example.org",
            "--folder",
            "taz/2024-05-02",
            "--high",
            "a.html",
            "b.png",
        ]);
        match cli.command {
            Some(Commands::Fetch {
                base_url,
                folder,
                high,
                names,
            }) => {
                assert_eq!(base_url, "https://cdn.example.org");
                assert_eq!(folder, "taz/2024-05-02");
                assert!(high);
                assert_eq!(names, vec!["a.html", "b.png"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_evict_requires_names() {
        assert!(Cli::try_parse_from(["folio", "evict"]).is_err());
    }

    #[test]
    fn test_scrub_flags() {
        let cli = Cli::parse_from(["folio", "scrub", "--minimal"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Scrub {
                minimal: true,
                json: false
            })
        ));
    }
}
