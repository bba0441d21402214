use std::collections::BTreeMap;

use crate::errors::StorageError;

/// Persistent string-to-string substrate the draft store writes through.
///
/// Sizes are measured in bytes of the stored value.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Every stored key with the size of its value.
    fn entries(&self) -> Result<Vec<(String, usize)>, StorageError>;

    fn total_size(&self) -> Result<usize, StorageError> {
        Ok(self.entries()?.iter().map(|(_, size)| size).sum())
    }
}

/// Rejects a write that would push the substrate past `quota`.
pub(crate) fn check_quota(
    quota: Option<usize>,
    used_without_key: usize,
    value: &str,
) -> Result<(), StorageError> {
    match quota {
        Some(quota) if used_without_key + value.len() > quota => Err(StorageError::QuotaExceeded {
            needed: value.len(),
            available: quota.saturating_sub(used_without_key),
        }),
        _ => Ok(()),
    }
}

/// In-process store, optionally bounded like a browser's local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let used: usize = self
            .entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum();
        check_quota(self.quota, used, value)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, usize)>, StorageError> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.len()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_counts_other_keys_only() {
        let mut store = MemoryStore::with_quota(10);
        store.set("a", "12345").unwrap();
        store.set("b", "12345").unwrap();
        // overwriting a key frees its old value first
        store.set("a", "abcde").unwrap();

        let err = store.set("c", "x").unwrap_err();
        assert!(err.is_quota());
        assert_eq!(store.total_size().unwrap(), 10);
        assert_eq!(store.get("c").unwrap(), None);
    }
}
