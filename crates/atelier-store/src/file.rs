//! File-backed [`LocalStorage`]: one file per key under a base directory.

use std::fs::{create_dir_all, read_to_string, rename, write};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::clients::LocalStorage;
use crate::error::{StoreError, StoreResult};

/// Persists items as `<base>/<key>.json`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileLocalStorage {
    base_path: PathBuf,
}

impl FileLocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();
        create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            || key.starts_with('.')
        {
            return Err(StoreError::Environment(format!(
                "invalid local storage key {key:?}"
            )));
        }
        Ok(self.base_path.join(format!("{key}.json")))
    }
}

impl LocalStorage for FileLocalStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let staging = path.with_extension("json.tmp");
        write(&staging, value)?;
        rename(&staging, &path)?;
        debug!(path = %path.display(), bytes = value.len(), "local snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_item_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileLocalStorage::new(dir.path()).unwrap();
        assert_eq!(storage.get_item("art-pieces").unwrap(), None);
    }

    #[test]
    fn items_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileLocalStorage::new(dir.path())
            .unwrap()
            .set_item("art-pieces", "[]")
            .unwrap();

        let reopened = FileLocalStorage::new(dir.path()).unwrap();
        assert_eq!(reopened.get_item("art-pieces").unwrap().as_deref(), Some("[]"));
        assert!(!dir.path().join("art-pieces.json.tmp").exists());
    }

    #[test]
    fn creates_nested_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileLocalStorage::new(&nested).unwrap();
        storage.set_item("k", "v").unwrap();
        assert!(nested.join("k.json").exists());
    }

    #[test]
    fn path_traversal_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileLocalStorage::new(dir.path()).unwrap();
        assert!(matches!(
            storage.set_item("../escape", "x"),
            Err(StoreError::Environment(_))
        ));
        assert!(storage.get_item("").is_err());
    }
}
