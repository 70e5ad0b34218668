//! Input validation: make sure an indexed path is a readable PDF.
//!
//! The file index can outlive the files it points at (the temp dir gets
//! cleaned, a download was interrupted). Checking existence, readability
//! and the `%PDF` magic bytes up front gives the user a precise message
//! instead of an opaque pdfium failure.

use crate::error::FinderError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Validate that `path` exists, is readable and starts with `%PDF`.
pub fn validate_pdf(path: &Path) -> Result<(), FinderError> {
    if !path.exists() {
        return Err(FinderError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(FinderError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(FinderError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(FinderError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated PDF: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file() {
        let err = validate_pdf(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, FinderError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fake.pdf");
        std::fs::write(&path, b"<html>").unwrap();
        match validate_pdf(&path).unwrap_err() {
            FinderError::NotAPdf { magic, .. } => assert_eq!(&magic, b"<htm"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pdf_header_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ok.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        validate_pdf(&path).unwrap();
    }
}
