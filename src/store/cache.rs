//! Result cache: `(file, tag)` → joined findings text.
//!
//! Entries never expire and are never invalidated. The key is the file's
//! base name and the tag joined with `_`, so a document replaced under the
//! same name keeps serving its old findings.

use super::{load_json, save_json};
use crate::error::FinderError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persistent `(file, tag)` → result map.
#[derive(Debug, Clone)]
pub struct ResultCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl ResultCache {
    /// Load the cache at `path` (empty if the file does not exist).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FinderError> {
        let path = path.into();
        let entries = load_json(&path)?;
        Ok(Self { path, entries })
    }

    /// Build the lookup key for a file and tag.
    ///
    /// Only the final path component of `file` is used, so a full local path
    /// and the bare display name produce the same key.
    pub fn cache_key(file: &str, tag: &str) -> String {
        let base = Path::new(file)
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| file.into());
        format!("{base}_{tag}")
    }

    pub fn get(&self, file: &str, tag: &str) -> Option<&str> {
        self.entries
            .get(&Self::cache_key(file, tag))
            .map(String::as_str)
    }

    /// Store a result and flush the whole map to disk.
    pub fn insert(
        &mut self,
        file: &str,
        tag: &str,
        text: impl Into<String>,
    ) -> Result<(), FinderError> {
        let key = Self::cache_key(file, tag);
        debug!("Caching result for '{}'", key);
        self.entries.insert(key, text.into());
        self.save()
    }

    pub fn save(&self) -> Result<(), FinderError> {
        save_json(&self.path, &self.entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_base_name() {
        assert_eq!(
            ResultCache::cache_key("/tmp/x/pdfs/divya_bhaskar.pdf", "rain"),
            "divya_bhaskar.pdf_rain"
        );
        assert_eq!(
            ResultCache::cache_key("divya_bhaskar.pdf", "rain"),
            "divya_bhaskar.pdf_rain"
        );
    }

    #[test]
    fn round_trip_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed_cache.json");

        let mut cache = ResultCache::open(&path).unwrap();
        assert!(cache.is_empty());
        cache
            .insert("sandesh.pdf", "ચૂંટણી", "Original: ...\n---\nSummary: election")
            .unwrap();
        cache.insert("sandesh.pdf", "cricket", "").unwrap();

        let reopened = ResultCache::open(&path).unwrap();
        assert_eq!(reopened.entries(), cache.entries());
        assert_eq!(
            reopened.get("sandesh.pdf", "ચૂંટણી"),
            Some("Original: ...\n---\nSummary: election")
        );
        assert_eq!(reopened.get("sandesh.pdf", "cricket"), Some(""));
        assert_eq!(reopened.get("sandesh.pdf", "weather"), None);
    }

    #[test]
    fn reads_cache_written_by_hand() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed_cache.json");
        std::fs::write(&path, r#"{"gujarat_samachar.pdf_rain": "heavy rain in Surat"}"#).unwrap();

        let cache = ResultCache::open(&path).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("gujarat_samachar.pdf", "rain"), Some("heavy rain in Surat"));
    }
}
