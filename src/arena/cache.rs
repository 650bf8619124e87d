//! Arena cache: one loaded geometry per distinct reference.
//!
//! Filled before the per-track phase, then handed to workers as a read-only
//! [`ArenaMap`] snapshot. Every track sharing a reference sees the same
//! `Arc<ArenaGeometry>`.

use super::{ArenaGeometry, ArenaReader};
use crate::track::{ArenaSource, TrackRecord};
use crate::Result;
use dashmap::DashMap;
use rayon::prelude::*;
use rayon::ThreadPool;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Read-only reference → geometry mapping shared with workers.
pub type ArenaMap = FxHashMap<String, Arc<ArenaGeometry>>;

/// Concurrent arena cache holding one geometry per reference.
///
/// # Example
///
/// ```rust
/// use trackset::arena::{ArenaCache, ArenaDescription, ArenaGeometry};
///
/// # fn main() -> trackset::Result<()> {
/// let cache = ArenaCache::new();
/// let mut description = ArenaDescription::new();
/// description.insert("arena.bounds".into(), "circle 0 0 50".into());
///
/// let a = cache.get_or_load("pool", || ArenaGeometry::from_description("pool", &description))?;
/// let b = cache.get_or_load("pool", || unreachable!())?;
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// assert_eq!(cache.loads(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ArenaCache {
    entries: DashMap<String, Arc<ArenaGeometry>>,
    loads: AtomicUsize,
}

impl ArenaCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached arenas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of loader invocations so far.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Look up a cached arena.
    #[must_use]
    pub fn get(&self, reference: &str) -> Option<Arc<ArenaGeometry>> {
        self.entries.get(reference).map(|e| Arc::clone(e.value()))
    }

    /// Return the cached arena for `reference`, running `load` if absent.
    ///
    /// `load` runs without holding any map lock, so loads of different
    /// references proceed in parallel. Two concurrent callers for the same
    /// absent reference may both load; the first insert wins and both get
    /// the cached geometry.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; nothing is cached on failure.
    pub fn get_or_load<F>(&self, reference: &str, load: F) -> Result<Arc<ArenaGeometry>>
    where
        F: FnOnce() -> Result<ArenaGeometry>,
    {
        if let Some(cached) = self.get(reference) {
            return Ok(cached);
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        let geometry = Arc::new(load()?);
        let cached = self
            .entries
            .entry(reference.to_string())
            .or_insert(geometry);
        Ok(Arc::clone(cached.value()))
    }

    /// Snapshot the cache for sharing with workers.
    #[must_use]
    pub fn snapshot(&self) -> ArenaMap {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect()
    }
}

/// Distinct non-missing shared arena references, in first-seen order.
#[must_use]
pub fn shared_references(records: &[TrackRecord]) -> Vec<&str> {
    let mut seen = FxHashSet::default();
    records
        .iter()
        .filter_map(|r| match &r.arena {
            ArenaSource::Shared(reference) => Some(reference.as_str()),
            ArenaSource::Inline(_) | ArenaSource::Missing => None,
        })
        .filter(|reference| seen.insert(*reference))
        .collect()
}

/// Load every distinct arena referenced by `records` from `project_dir`.
///
/// References are deduplicated first, so each one is loaded exactly once.
/// With a worker pool, distinct arenas load in parallel.
///
/// # Errors
///
/// Returns the first arena load failure; arena errors are fatal.
pub fn resolve_shared(
    records: &[TrackRecord],
    project_dir: &Path,
    reader: &dyn ArenaReader,
    pool: Option<&ThreadPool>,
) -> Result<ArenaCache> {
    let cache = ArenaCache::new();
    let references = shared_references(records);

    let load = |reference: &str| -> Result<()> {
        cache.get_or_load(reference, || {
            let file = project_dir.join(reference);
            tracing::debug!(arena = reference, file = %file.display(), "loading arena");
            reader.read_arena(Some(&file), None)
        })?;
        Ok(())
    };

    match pool {
        Some(pool) => pool.install(|| references.par_iter().try_for_each(|r| load(*r)))?,
        None => references.iter().try_for_each(|r| load(*r))?,
    }
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Identity, PathSource};
    use indexmap::IndexMap;

    fn record(id: &str, arena: ArenaSource) -> TrackRecord {
        TrackRecord {
            id: id.to_string(),
            identity: Identity::default(),
            factors: IndexMap::new(),
            path: PathSource::File {
                reference: None,
                format: None,
                index: None,
            },
            arena,
        }
    }

    #[test]
    fn test_shared_references_distinct_in_order() {
        let records = vec![
            record("1", ArenaSource::Shared("b.txt".into())),
            record("2", ArenaSource::Missing),
            record("3", ArenaSource::Shared("a.txt".into())),
            record("4", ArenaSource::Shared("b.txt".into())),
        ];
        assert_eq!(shared_references(&records), vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = ArenaCache::new();
        let result = cache.get_or_load("pool", || {
            Err(crate::Error::Other("unreadable".to_string()))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.loads(), 1);
    }

    #[test]
    fn test_loader_can_read_the_cache() {
        let cache = ArenaCache::new();
        cache
            .get_or_load("a", || Ok(ArenaGeometry::test_circle()))
            .unwrap();
        let loaded = cache
            .get_or_load("b", || {
                assert!(cache.get("a").is_some());
                assert!(cache.get("b").is_none());
                Ok(ArenaGeometry::test_circle())
            })
            .unwrap();
        assert!(Arc::ptr_eq(&loaded, &cache.get("b").unwrap()));
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn test_snapshot_shares_geometry() {
        let cache = ArenaCache::new();
        let loaded = cache
            .get_or_load("pool", || Ok(ArenaGeometry::test_circle()))
            .unwrap();
        let snapshot = cache.snapshot();
        assert!(Arc::ptr_eq(&loaded, &snapshot["pool"]));
    }
}
