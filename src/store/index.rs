//! File index: drive display name → local mirrored path.
//!
//! A PDF counts as synced only when it appears here.

use super::{load_json, save_json};
use crate::error::FinderError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Persistent map of synced files.
#[derive(Debug, Clone)]
pub struct FileIndex {
    path: PathBuf,
    files: BTreeMap<String, PathBuf>,
}

impl FileIndex {
    /// Load the index at `path` (empty if the file does not exist).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FinderError> {
        let path = path.into();
        let files = load_json(&path)?;
        Ok(Self { path, files })
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.files.get(name).map(PathBuf::as_path)
    }

    /// Record a file in memory. Call [`FileIndex::save`] to persist.
    pub fn insert(&mut self, name: impl Into<String>, local_path: impl Into<PathBuf>) {
        self.files.insert(name.into(), local_path.into());
    }

    /// Display names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    pub fn save(&self) -> Result<(), FinderError> {
        save_json(&self.path, &self.files)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
