// In-memory record store
//
// Keyed, versioned record storage with Get / Put / CompareAndSwap semantics.
// Every mutation of an order, stock entry, or loyalty account goes through
// compare_and_swap so that concurrent writers to the same key are serialized
// by optimistic version checks while writers to different keys never contend.

use dashmap::DashMap;
use std::hash::Hash;
use thiserror::Error;

/// Error type for record store operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No record exists under the requested key
    #[error("Record not found")]
    NotFound,

    /// The record was modified since it was read
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },
}

/// A record together with its monotonically increasing version
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: u64,
    pub record: T,
}

/// Concurrent keyed store of versioned records
///
/// Backed by a sharded concurrent map; reads return clones so no map lock is
/// held across caller code.
pub struct MemoryStore<K, T> {
    entries: DashMap<K, Versioned<T>>,
}

impl<K, T> MemoryStore<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Fetch the current version of a record, if present
    pub fn get(&self, key: &K) -> Option<Versioned<T>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or overwrite a record unconditionally
    ///
    /// Bumps the version when a record already exists under the key.
    /// Use `compare_and_swap` for read-modify-write cycles.
    pub fn put(&self, key: K, record: T) -> Versioned<T> {
        let mut slot = self.entries.entry(key).or_insert(Versioned {
            version: 0,
            record: record.clone(),
        });
        if slot.version > 0 {
            slot.version += 1;
            slot.record = record;
        } else {
            slot.version = 1;
        }
        slot.value().clone()
    }

    /// Replace a record only if its version still matches `expected_version`
    ///
    /// The check and the write happen under the entry's shard lock, so two
    /// writers racing on the same key cannot both succeed.
    pub fn compare_and_swap(
        &self,
        key: &K,
        expected_version: u64,
        record: T,
    ) -> Result<Versioned<T>, StoreError> {
        let mut slot = self.entries.get_mut(key).ok_or(StoreError::NotFound)?;
        if slot.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: slot.version,
            });
        }
        slot.version += 1;
        slot.record = record;
        Ok(slot.value().clone())
    }

    /// True if a record exists under the key
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Lazily iterate over snapshots of all records
    ///
    /// Restartable: each call starts a fresh pass over the live map.
    pub fn scan(&self) -> impl Iterator<Item = (K, Versioned<T>)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    /// Number of records in the store
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no records are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, T> Default for MemoryStore<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_assigns_version_one() {
        let store: MemoryStore<i32, String> = MemoryStore::new();
        let stored = store.put(1, "a".to_string());
        assert_eq!(stored.version, 1);
        assert_eq!(stored.record, "a");
    }

    #[test]
    fn test_put_overwrite_bumps_version() {
        let store: MemoryStore<i32, String> = MemoryStore::new();
        store.put(1, "a".to_string());
        let stored = store.put(1, "b".to_string());
        assert_eq!(stored.version, 2);
        assert_eq!(stored.record, "b");
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store: MemoryStore<i32, String> = MemoryStore::new();
        assert!(store.get(&42).is_none());
    }

    #[test]
    fn test_cas_succeeds_with_matching_version() {
        let store: MemoryStore<i32, String> = MemoryStore::new();
        let stored = store.put(1, "a".to_string());
        let updated = store
            .compare_and_swap(&1, stored.version, "b".to_string())
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.record, "b");
    }

    #[test]
    fn test_cas_rejects_stale_version() {
        let store: MemoryStore<i32, String> = MemoryStore::new();
        let stale = store.put(1, "a".to_string());
        store.put(1, "b".to_string());

        let result = store.compare_and_swap(&1, stale.version, "c".to_string());
        assert_eq!(
            result.unwrap_err(),
            StoreError::VersionConflict {
                expected: 1,
                actual: 2
            }
        );
        // Losing writer must not have changed the record
        assert_eq!(store.get(&1).unwrap().record, "b");
    }

    #[test]
    fn test_cas_missing_key_is_not_found() {
        let store: MemoryStore<i32, String> = MemoryStore::new();
        let result = store.compare_and_swap(&1, 1, "a".to_string());
        assert_eq!(result.unwrap_err(), StoreError::NotFound);
    }

    #[test]
    fn test_scan_is_restartable() {
        let store: MemoryStore<i32, i32> = MemoryStore::new();
        store.put(1, 10);
        store.put(2, 20);

        let first: Vec<_> = store.scan().collect();
        let second: Vec<_> = store.scan().collect();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_concurrent_cas_single_winner() {
        use std::sync::Arc;

        let store: Arc<MemoryStore<i32, i32>> = Arc::new(MemoryStore::new());
        let base = store.put(1, 0);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let version = base.version;
            handles.push(std::thread::spawn(move || {
                store.compare_and_swap(&1, version, i).is_ok()
            }));
        }

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.get(&1).unwrap().version, base.version + 1);
    }
}
