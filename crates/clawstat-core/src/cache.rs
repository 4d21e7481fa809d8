//! Cache primitives shared by the parser, the aggregator and the cron reader
//!
//! Two independent caches with distinct key types:
//!
//! - [`FileCache`] holds one value per file path and is authoritative only
//!   while the file's [`FileIdentity`] (modification time, byte size) is
//!   unchanged. Any mismatch evicts the entry.
//! - [`TtlCache`] holds one value per query key and is valid for a fixed
//!   duration after it was stored, regardless of what happened on disk.
//!
//! Both are internally synchronized; the check-compute-store sequence of
//! [`TtlCache::get_or_compute`] runs under the cache's lock so concurrent
//! callers cannot race each other into redundant recomputation.

use std::collections::HashMap;
use std::fs::Metadata;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};

/// Cheap proxy for "file contents unchanged"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    pub modified: SystemTime,
    pub len: u64,
}

impl FileIdentity {
    /// Build an identity from already fetched metadata
    pub fn from_metadata(meta: &Metadata) -> std::io::Result<Self> {
        Ok(Self {
            modified: meta.modified()?,
            len: meta.len(),
        })
    }

    /// Stat `path` and build its identity
    pub fn of(path: &Path) -> std::io::Result<Self> {
        Self::from_metadata(&std::fs::metadata(path)?)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic inside a compute closure must not take the cache down with it
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct FileEntry<V> {
    identity: FileIdentity,
    value: Arc<V>,
}

/// Per-file cache validated by file identity
pub struct FileCache<V> {
    entries: Mutex<HashMap<PathBuf, FileEntry<V>>>,
}

impl<V> Default for FileCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> FileCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value if it was stored under exactly `identity`
    ///
    /// A stale entry is dropped on the spot.
    pub fn get(&self, path: &Path, identity: &FileIdentity) -> Option<Arc<V>> {
        let mut entries = lock(&self.entries);
        match entries.get(path) {
            Some(entry) if entry.identity == *identity => Some(Arc::clone(&entry.value)),
            Some(_) => {
                entries.remove(path);
                None
            }
            None => None,
        }
    }

    /// Store `value` for `path`, replacing any previous entry
    pub fn insert(&self, path: PathBuf, identity: FileIdentity, value: Arc<V>) {
        lock(&self.entries).insert(path, FileEntry { identity, value });
    }

    /// Drop the entry for one file. Returns whether anything was cached.
    pub fn invalidate(&self, path: &Path) -> bool {
        lock(&self.entries).remove(path).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// Keep only the entries whose path satisfies `keep`. Returns how many were dropped.
    pub fn retain(&self, mut keep: impl FnMut(&Path) -> bool) -> usize {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|path, _| keep(path));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct TtlEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Query-result cache with a fixed time-to-live
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, TtlEntry<V>>>,
    computations: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            computations: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a clone of the value stored under `key` if it is younger than the TTL
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = lock(&self.entries);
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key` with a fresh timestamp
    pub fn insert(&self, key: K, value: V) {
        lock(&self.entries).insert(
            key,
            TtlEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return the fresh cached value or compute, store and return a new one
    pub fn get_or_compute(&self, key: K, compute: impl FnOnce() -> V) -> V {
        let mut entries = lock(&self.entries);
        if let Some(entry) = entries.get(&key)
            && entry.stored_at.elapsed() < self.ttl
        {
            return entry.value.clone();
        }

        self.computations.fetch_add(1, Ordering::Relaxed);
        let value = compute();
        entries.insert(
            key,
            TtlEntry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        value
    }

    /// Drop the entry for one key. Returns whether anything was cached.
    pub fn invalidate(&self, key: &K) -> bool {
        lock(&self.entries).remove(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// How many times `get_or_compute` had to run its closure
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }
}
