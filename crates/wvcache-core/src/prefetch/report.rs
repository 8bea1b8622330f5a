//! Summary of one prefetch run.

use super::{PrefetchError, PrefetchOutcome};

/// Per-run counters plus the failures, so no manifest URL goes unaccounted for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    /// Distinct URLs attempted.
    pub entries: usize,
    pub already_cached: usize,
    pub loaded_from_disk: usize,
    pub fetched: usize,
    /// Fetched and served from memory, but the disk write failed.
    pub persist_failures: usize,
    /// `(url, reason)` for every entry that is not in the store.
    pub failures: Vec<(String, String)>,
}

impl PrefetchReport {
    pub(crate) fn record(&mut self, url: &str, result: &Result<PrefetchOutcome, PrefetchError>) {
        match result {
            Ok(PrefetchOutcome::AlreadyCached) => self.already_cached += 1,
            Ok(PrefetchOutcome::LoadedFromDisk) => self.loaded_from_disk += 1,
            Ok(PrefetchOutcome::Fetched { persisted }) => {
                self.fetched += 1;
                if !persisted {
                    self.persist_failures += 1;
                }
            }
            Err(e) => self.failures.push((url.to_string(), e.to_string())),
        }
    }

    /// Entries that ended up in the store.
    pub fn cached(&self) -> usize {
        self.already_cached + self.loaded_from_disk + self.fetched
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
