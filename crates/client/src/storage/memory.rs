//! In-memory storage backend.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::{KeyValueStorage, StorageError};

/// A process-local map.
///
/// With a quota, writes that would push the total size of keys plus values
/// past the limit fail with [`StorageError::QuotaExceeded`], the way a
/// browser's local storage does.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store capped at `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }

    fn used_without(entries: &BTreeMap<String, String>, skip: &str) -> usize {
        entries
            .iter()
            .filter(|(k, _)| k.as_str() != skip)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(limit) = self.quota {
            let needed = Self::used_without(&entries, key) + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    limit,
                });
            }
        }
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("cart"), None);

        storage.set("cart", "[]").unwrap();
        assert_eq!(storage.get("cart").as_deref(), Some("[]"));

        storage.remove("cart").unwrap();
        assert_eq!(storage.get("cart"), None);
        // Removing again is fine
        storage.remove("cart").unwrap();
    }

    #[test]
    fn test_keys_sorted() {
        let storage = MemoryStorage::new();
        storage.set("wishlist", "[]").unwrap();
        storage.set("cart", "[]").unwrap();
        assert_eq!(storage.keys(), vec!["cart", "wishlist"]);
    }

    #[test]
    fn test_quota_exceeded() {
        let storage = MemoryStorage::with_quota(10);
        storage.set("cart", "[]").unwrap();

        let err = storage.set("orders", "[{\"id\":1}]").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 10, .. }));
        assert_eq!(storage.get("orders"), None);
    }

    #[test]
    fn test_quota_counts_replacement_not_both_values() {
        let storage = MemoryStorage::with_quota(8);
        storage.set("cart", "1234").unwrap();
        // Replacing the same key only counts the new value
        storage.set("cart", "abcd").unwrap();
        assert_eq!(storage.get("cart").as_deref(), Some("abcd"));
    }
}
