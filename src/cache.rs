use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::hash::Fingerprint;

/// Compiled dependency, stored as the inline reference that replaces its import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub reference: String,
    /// Every file name the module's imports were resolved against, transitively,
    /// with the fingerprint it had at the time. `None` marks a name that was
    /// absent.
    pub dependencies: BTreeMap<String, Option<Fingerprint>>,
}

/// Hit/miss file names recorded since the last [`TransformCache::take_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: Vec<String>,
    pub misses: Vec<String>,
}

/// Per-file transform cache owned by the compile unit.
///
/// An entry is reused only while the file's own fingerprint and the
/// fingerprints of everything its imports resolved against are unchanged. A
/// file that appears under a recorded absent name also makes it stale. Stale
/// entries are overwritten, never evicted otherwise.
#[derive(Debug, Default)]
pub struct TransformCache {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entry for `name`, if still valid.
    ///
    /// `current` returns the present fingerprint of a file, or `None` once the
    /// file is gone.
    pub fn lookup<F>(&self, name: &str, fingerprint: Fingerprint, current: F) -> Option<&CacheEntry>
    where
        F: Fn(&str) -> Option<Fingerprint>,
    {
        let entry = self.entries.get(name)?;
        if entry.fingerprint != fingerprint {
            return None;
        }
        let fresh = entry
            .dependencies
            .iter()
            .all(|(dep, fp)| current(dep) == *fp);
        fresh.then_some(entry)
    }

    pub fn store(&mut self, name: &str, entry: CacheEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    /// Return the valid entry for `name` or build and store a new one.
    ///
    /// `compute` receives the cache so it can resolve nested dependencies.
    pub fn get_or_compute<F, C, E>(
        &mut self,
        name: &str,
        fingerprint: Fingerprint,
        current: F,
        compute: C,
    ) -> Result<CacheEntry, E>
    where
        F: Fn(&str) -> Option<Fingerprint>,
        C: FnOnce(&mut Self) -> Result<CacheEntry, E>,
    {
        if let Some(entry) = self.lookup(name, fingerprint, current) {
            let entry = entry.clone();
            debug!(file = name, %fingerprint, "transform cache hit");
            self.stats.hits.push(name.to_string());
            return Ok(entry);
        }

        debug!(file = name, %fingerprint, "transform cache miss");
        self.stats.misses.push(name.to_string());
        let entry = compute(self)?;
        self.store(name, entry.clone());
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn take_stats(&mut self) -> CacheStats {
        std::mem::take(&mut self.stats)
    }
}
