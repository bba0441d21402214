use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::kv::{KeyValueStore, check_quota};
use crate::errors::StorageError;

const EXTENSION: &str = "json";
const LOCK_FILE: &str = ".storage.lock";

/// Directory-backed store: one `<key>.json` file per key.
///
/// Writes go to a temporary file that is renamed into place while holding an
/// exclusive lock on the directory's lock file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, quota: None })
    }

    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }

    fn lock(&self) -> Result<File, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(file)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let lock = self.lock()?;

        if self.quota.is_some() {
            let used: usize = self
                .entries()?
                .into_iter()
                .filter(|(k, _)| k != key)
                .map(|(_, size)| size)
                .sum();
            check_quota(self.quota, used, value)?;
        }

        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        {
            let mut f = File::create(&tmp)?;
            f.write_all(value.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        fs2::FileExt::unlock(&lock)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let lock = self.lock()?;
        let result = match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        };
        fs2::FileExt::unlock(&lock)?;
        result
    }

    fn entries(&self) -> Result<Vec<(String, usize)>, StorageError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let size = usize::try_from(entry.metadata()?.len()).unwrap_or(usize::MAX);
            entries.push((key.to_string(), size));
        }
        entries.sort();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_get_remove() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get("draft").unwrap(), None);
        store.set("draft", "{\"a\":1}").unwrap();
        assert_eq!(store.get("draft").unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(store.entries().unwrap(), vec![("draft".to_string(), 7)]);

        store.remove("draft").unwrap();
        store.remove("draft").unwrap();
        assert_eq!(store.get("draft").unwrap(), None);
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        for key in ["../escape", "", ".hidden", "a/b"] {
            assert!(matches!(store.set(key, "x"), Err(StorageError::InvalidKey(_))));
        }
    }

    #[test]
    fn quota_applies_across_files() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap().with_quota(8);
        store.set("one", "1234").unwrap();
        assert!(store.set("two", "12345").unwrap_err().is_quota());
        store.set("two", "1234").unwrap();
        assert_eq!(store.total_size().unwrap(), 8);
    }
}
