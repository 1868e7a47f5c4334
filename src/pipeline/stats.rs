use std::fmt;
use std::ops::AddAssign;

use serde::Serialize;

/// Counters for one tick; built fresh per tick and logged, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub entries: usize,
    /// added + skipped
    pub processed: usize,
    pub added: usize,
    pub removed: usize,
    /// download failures
    pub ignored: usize,
    pub skipped: usize,
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, rhs: Self) {
        self.entries += rhs.entries;
        self.processed += rhs.processed;
        self.added += rhs.added;
        self.removed += rhs.removed;
        self.ignored += rhs.ignored;
        self.skipped += rhs.skipped;
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entries: {}, processed: {}, updated: {}, removed: {}, ignored: {}, skipped: {}",
            self.entries, self.processed, self.added, self.removed, self.ignored, self.skipped
        )
    }
}
