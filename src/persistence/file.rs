//! Directory-backed store for native builds
//!
//! One `<key>.json` file per record. Writes land in `<key>.json.tmp` first
//! and are renamed into place, so a reader only ever sees a whole record.
//! Batch writes keep `<key>.json.bak` copies until every rename succeeds.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{Store, StoreError};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        log::info!("Using data directory {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn tmp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json.tmp"))
    }

    fn backup_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json.bak"))
    }

    fn stage(&self, key: &str, value: &str) -> Result<PathBuf, StoreError> {
        let tmp = self.tmp_path_for(key);
        fs::write(&tmp, value).map_err(|source| io_error(key, source))?;
        Ok(tmp)
    }

    fn commit(&self, key: &str, tmp: &Path) -> Result<(), StoreError> {
        fs::rename(tmp, self.path_for(key)).map_err(|source| io_error(key, source))
    }

    /// Copy the current record aside. Returns whether there was one.
    fn back_up(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(false);
        }
        fs::copy(&path, self.backup_path_for(key)).map_err(|source| io_error(key, source))?;
        Ok(true)
    }

    /// Put back the record a failed batch already replaced
    fn restore(&self, key: &str, had_record: bool) {
        let result = if had_record {
            fs::rename(self.backup_path_for(key), self.path_for(key))
        } else {
            fs::remove_file(self.path_for(key))
        };
        if let Err(e) = result {
            log::error!("Failed to roll back {}: {}", key, e);
        }
    }

    fn discard(&self, staged: &[Staged<'_>]) {
        for entry in staged {
            let _ = fs::remove_file(&entry.tmp);
            if entry.had_record {
                let _ = fs::remove_file(self.backup_path_for(entry.key));
            }
        }
    }
}

/// A batch entry written to its temp file but not yet renamed
struct Staged<'a> {
    key: &'a str,
    tmp: PathBuf,
    had_record: bool,
}

fn io_error(key: &str, source: io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 bytes are a corrupt record, not an I/O failure
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(source) => Err(io_error(key, source)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let tmp = self.stage(key, value)?;
        self.commit(key, &tmp)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(key, source)),
        }
    }

    /// Stage and back up every record before renaming any of them. If a
    /// rename fails, records already replaced are restored.
    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut staged: Vec<Staged<'_>> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let prepared = self.stage(key, value).and_then(|tmp| {
                let had_record = self.back_up(key).inspect_err(|_| {
                    let _ = fs::remove_file(&tmp);
                })?;
                Ok(Staged {
                    key: *key,
                    tmp,
                    had_record,
                })
            });
            match prepared {
                Ok(entry) => staged.push(entry),
                Err(e) => {
                    self.discard(&staged);
                    return Err(e);
                }
            }
        }

        for (i, entry) in staged.iter().enumerate() {
            if let Err(e) = self.commit(entry.key, &entry.tmp) {
                log::error!("Batch write failed at {}, rolling back", entry.key);
                for done in &staged[..i] {
                    self.restore(done.key, done.had_record);
                }
                self.discard(&staged);
                return Err(e);
            }
        }
        self.discard(&staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::load_record;

    fn temp_store(name: &str) -> FileStore {
        let dir = std::env::temp_dir().join(format!(
            "estoura-tudo-{}-{}-{}",
            name,
            std::process::id(),
            crate::now_millis()
        ));
        FileStore::open(dir).unwrap()
    }

    #[test]
    fn test_file_store_roundtrip() {
        let mut store = temp_store("roundtrip");
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "[1,2]").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("[1,2]"));
        assert!(!store.tmp_path_for("a").exists());
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_file_store_set_many() {
        let mut store = temp_store("batch");
        store
            .set_many(&[("x", "1".to_string()), ("y", "2".to_string())])
            .unwrap();
        assert_eq!(store.get("x").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("y").unwrap().as_deref(), Some("2"));
        assert!(!store.backup_path_for("x").exists());
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_file_store_set_many_rolls_back_on_failed_rename() {
        let mut store = temp_store("rollback");
        store.set("x", "old-x").unwrap();
        // A non-empty directory at y.json makes the rename onto it fail
        fs::create_dir_all(store.path_for("y").join("blocker")).unwrap();

        let result = store.set_many(&[("x", "new-x".to_string()), ("y", "new-y".to_string())]);
        assert!(result.is_err());
        assert_eq!(store.get("x").unwrap().as_deref(), Some("old-x"));
        for key in ["x", "y"] {
            assert!(!store.tmp_path_for(key).exists());
            assert!(!store.backup_path_for(key).exists());
        }
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_file_store_set_many_removes_new_record_on_rollback() {
        let mut store = temp_store("rollback-new");
        fs::create_dir_all(store.path_for("y").join("blocker")).unwrap();

        let result = store.set_many(&[("x", "new-x".to_string()), ("y", "new-y".to_string())]);
        assert!(result.is_err());
        assert_eq!(store.get("x").unwrap(), None);
        assert!(!store.tmp_path_for("y").exists());
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_file_store_clears_corrupt_record() {
        let mut store = temp_store("corrupt");
        fs::write(store.path_for("nums"), b"\xff\xfe garbage").unwrap();
        let nums: Option<Vec<u32>> = load_record(&mut store, "nums").unwrap();
        assert_eq!(nums, None);
        assert!(!store.path_for("nums").exists());
        let _ = fs::remove_dir_all(store.dir());
    }
}
