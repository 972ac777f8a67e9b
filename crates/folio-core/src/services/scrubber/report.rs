use serde::{Deserialize, Serialize};

/// Counters for one scrub phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStats {
    /// Rows deleted.
    pub deleted: u64,
    /// Rows left in place (retention, bookmarks, residual references).
    pub retained: u64,
}

/// Outcome of a scrub pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrubReport {
    pub sections: PhaseStats,
    pub moments: PhaseStats,
    pub front_pages: PhaseStats,
    pub pages: PhaseStats,
    pub articles: PhaseStats,
    pub resource_infos: PhaseStats,
    pub images: PhaseStats,
    pub audios: PhaseStats,
    pub files: PhaseStats,
    /// Bytes removed from disk.
    pub bytes_reclaimed: u64,
    /// Files whose bytes could not be removed.
    pub disk_errors: u64,
    /// Whether the share cache was cleared.
    pub share_cache_cleared: bool,
}

impl ScrubReport {
    /// Total rows deleted across all phases.
    pub const fn total_deleted(&self) -> u64 {
        self.sections.deleted
            + self.moments.deleted
            + self.front_pages.deleted
            + self.pages.deleted
            + self.articles.deleted
            + self.resource_infos.deleted
            + self.images.deleted
            + self.audios.deleted
            + self.files.deleted
    }
}
