//! Poster blob storage.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

/// Stores opaque blobs under caller-chosen names and hands back a reference
/// usable to locate them later.
pub trait FileStore: Send + Sync {
    fn store(&self, bytes: &[u8], name: &str) -> Result<String, FileStoreError>;
}

/// Flat-directory file store.
pub struct FsFileStore {
    root: PathBuf,
}

impl FsFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path_for(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }
}

impl FileStore for FsFileStore {
    fn store(&self, bytes: &[u8], name: &str) -> Result<String, FileStoreError> {
        // names are flattened to their final component so a crafted name
        // can't escape the root
        let file_name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FileStoreError::InvalidName(name.to_string()))?;

        fs::write(self.root.join(file_name), bytes)?;
        Ok(file_name.to_string())
    }
}
