//! File-backed key-value store.
//!
//! All keys live in one JSON object on disk. Writes go to a sibling temp
//! file which is then renamed over the original, so a crash mid-write
//! leaves the previous contents intact. A file that is not a JSON object
//! of strings is moved aside to `<path>.corrupt-<uuid>` and the store
//! starts over with no entries.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{KeyValueStore, StorageError};

type Entries = BTreeMap<String, String>;

/// A key-value store persisted as a JSON object file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_entries(&self) -> Result<Entries, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(parse_err) => {
                let aside = self.sibling(&format!("corrupt-{}", Uuid::new_v4()));
                if let Err(e) = std::fs::rename(&self.path, &aside)
                    && e.kind() != ErrorKind::NotFound
                {
                    return Err(self.io_error(e));
                }
                warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %parse_err,
                    "Store file is corrupt, starting empty"
                );
                Ok(Entries::new())
            }
        }
    }

    /// `<path>.<suffix>`, next to the backing file.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".");
        path.push(suffix);
        PathBuf::from(path)
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Encode {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.sibling(&format!("tmp-{}", Uuid::new_v4()));
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }
        debug!(path = %self.path.display(), keys = entries.len(), "Wrote store file");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;

        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("rocketshoes-{}", uuid::Uuid::new_v4()))
            .join("storage.json")
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let store = FileStore::new(temp_path());
        assert_eq!(store.get("@RocketShoes:cart").unwrap(), None);
    }

    #[test]
    fn test_set_creates_parent_and_persists() {
        let path = temp_path();
        let store = FileStore::new(&path);
        store.set("@RocketShoes:cart", r#"[{"id":1}]"#).unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("@RocketShoes:cart").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_set_preserves_other_keys() {
        let path = temp_path();
        let store = FileStore::new(&path);
        store.set("@RocketShoes:theme", "dark").unwrap();
        store.set("@RocketShoes:cart", "[]").unwrap();
        store.set("@RocketShoes:cart", "[1]").unwrap();

        assert_eq!(store.get("@RocketShoes:theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get("@RocketShoes:cart").unwrap().as_deref(), Some("[1]"));

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    fn dir_entries(path: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{garbage").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get("@RocketShoes:cart").unwrap(), None);

        let names = dir_entries(&path);
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("storage.json.corrupt-"));
        let aside = path.parent().unwrap().join(&names[0]);
        assert_eq!(std::fs::read_to_string(aside).unwrap(), "{garbage");

        store.set("@RocketShoes:cart", "[]").unwrap();
        assert_eq!(store.get("@RocketShoes:cart").unwrap().as_deref(), Some("[]"));

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let path = temp_path();
        let store = FileStore::new(&path);
        store.set("@RocketShoes:cart", "[]").unwrap();
        store.set("@RocketShoes:cart", "[1]").unwrap();

        assert_eq!(dir_entries(&path), ["storage.json"]);

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_encode_error_names_the_file() {
        let source = serde_json::from_str::<Entries>("[").unwrap_err();
        let err = StorageError::Encode {
            path: PathBuf::from("/tmp/storage.json"),
            source,
        };
        assert!(err.to_string().starts_with("Could not encode store file /tmp/storage.json"));
    }
}
