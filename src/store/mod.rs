//! Flat JSON key-value stores persisted under the cache directory.
//!
//! Two maps survive between runs:
//!
//! * [`ResultCache`]: `"{file}_{tag}"` → joined model findings
//! * [`FileIndex`]: drive display name → local PDF path
//!
//! Both are loaded once at startup, mutated in memory and flushed after
//! every mutation. The on-disk format is a single pretty-printed JSON
//! object with non-ASCII text written verbatim, so Gujarati results stay
//! readable in an editor.

pub mod cache;
pub mod index;

pub use cache::ResultCache;
pub use index::FileIndex;

use crate::error::FinderError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Load a JSON document, returning `T::default()` when the file is absent.
///
/// A file that exists but does not parse is a hard error.
pub fn load_json<T>(path: &Path) -> Result<T, FinderError>
where
    T: DeserializeOwned + Default,
{
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No store at {}, starting empty", path.display());
            return Ok(T::default());
        }
        Err(e) => {
            return Err(FinderError::CorruptStore {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })
        }
    };

    serde_json::from_str(&raw).map_err(|e| FinderError::CorruptStore {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Serialise `value` as pretty JSON and atomically replace `path`.
///
/// Atomic write: temp file in the same directory, then rename.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FinderError> {
    let write_err = |source: std::io::Error| FinderError::StoreWrite {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| FinderError::Internal(format!("serialise {}: {e}", path.display())))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Saved {} bytes to {}", json.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_loads_default() {
        let tmp = tempfile::tempdir().unwrap();
        let map: BTreeMap<String, String> = load_json(&tmp.path().join("absent.json")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn gujarati_text_is_not_escaped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.json");
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), "વરસાદ".to_string());
        save_json(&path, &map).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("વરસાદ"), "got: {raw}");
        assert!(raw.contains("\n  \"k\""), "expected two-space indent, got: {raw}");
    }

    #[test]
    fn malformed_file_is_corrupt_store() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_json::<BTreeMap<String, String>>(&path).unwrap_err();
        assert!(matches!(err, FinderError::CorruptStore { .. }));
    }

    #[test]
    fn save_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a/b/store.json");
        save_json(&path, &BTreeMap::<String, String>::new()).unwrap();
        assert!(path.exists());
    }
}
