//! Single-target persistence.
//!
//! The store holds exactly one embedding in one file. Every save replaces the
//! whole file; nothing else is recorded alongside the vector.

use crate::types::Embedding;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default store location, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "target_face.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt target record in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize target: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("stored target is empty")]
    EmptyVector,
}

#[derive(Debug, Clone)]
pub struct TargetStore {
    path: PathBuf,
}

impl TargetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored target. A missing file is `Ok(None)`.
    pub fn try_load(&self) -> Result<Option<Embedding>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let embedding: Embedding =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        if embedding.values.is_empty() {
            return Err(StoreError::EmptyVector);
        }
        Ok(Some(embedding))
    }

    /// Read the stored target, treating any failure as "no target".
    pub fn load(&self) -> Option<Embedding> {
        match self.try_load() {
            Ok(Some(embedding)) => {
                tracing::info!(
                    path = %self.path.display(),
                    dim = embedding.dim(),
                    "loaded stored target"
                );
                Some(embedding)
            }
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "no stored target");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored target unreadable; starting without a target");
                None
            }
        }
    }

    /// Replace the stored target.
    ///
    /// Writes a sibling temp file, syncs it, then renames it over the store
    /// path so readers see either the old or the new vector in full.
    pub fn save(&self, embedding: &Embedding) -> Result<(), StoreError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| StoreError::Io { path, source }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let data = serde_json::to_vec(embedding)?;

        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp).map_err(io_err(&tmp))?;
            file.write_all(&data).map_err(io_err(&tmp))?;
            file.sync_all().map_err(io_err(&tmp))?;
        }
        fs::rename(&tmp, &self.path).map_err(io_err(&self.path))?;

        tracing::debug!(path = %self.path.display(), bytes = data.len(), "target saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "target".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store() -> (PathBuf, TargetStore) {
        let dir = std::env::temp_dir().join(format!("facegate-store-{}", uuid::Uuid::new_v4()));
        let store = TargetStore::new(dir.join("target_face.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_unset() {
        let (_dir, store) = scratch_store();
        assert!(store.try_load().unwrap().is_none());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let (dir, store) = scratch_store();
        let e = Embedding::new(vec![0.1, 0.2, 0.3]);
        store.save(&e).unwrap();
        assert_eq!(store.load(), Some(e));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_save_overwrites_previous() {
        let (dir, store) = scratch_store();
        store.save(&Embedding::new(vec![1.0, 0.0])).unwrap();
        store.save(&Embedding::new(vec![0.0, 1.0])).unwrap();
        assert_eq!(store.load(), Some(Embedding::new(vec![0.0, 1.0])));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (dir, store) = scratch_store();
        store.save(&Embedding::new(vec![1.0])).unwrap();
        assert!(!store.temp_path().exists());
        let entries = fs::read_dir(&dir).unwrap().count();
        assert_eq!(entries, 1);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_corrupt_file_is_unset() {
        let (dir, store) = scratch_store();
        fs::create_dir_all(&dir).unwrap();
        fs::write(store.path(), b"{not json").unwrap();
        assert!(matches!(store.try_load(), Err(StoreError::Corrupt { .. })));
        assert!(store.load().is_none());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_empty_vector_is_rejected() {
        let (dir, store) = scratch_store();
        fs::create_dir_all(&dir).unwrap();
        fs::write(store.path(), b"[]").unwrap();
        assert!(matches!(store.try_load(), Err(StoreError::EmptyVector)));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let store = TargetStore::new("data/target_face.json");
        assert_eq!(store.temp_path(), PathBuf::from("data/target_face.json.tmp"));
    }
}
