//! Error types for the gujarati-news-finder library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`FinderError`]: **Fatal**: the operation cannot proceed at all
//!   (file not synced, corrupt PDF, drive token rejected, cache file
//!   unreadable). Returned as `Err(FinderError)` from sync, search and the
//!   store loaders.
//!
//! * [`PageError`]: **Non-fatal**: the model call for a single page failed.
//!   The page contributes nothing to the result and the search moves on to
//!   the next page.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the gujarati-news-finder library.
#[derive(Debug, Error)]
pub enum FinderError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No file was selected for the search.
    #[error("Please select a file!")]
    NoFileSelected,

    /// The search tag was empty or whitespace.
    #[error("Please enter a search tag!")]
    EmptyTag,

    /// The selected name is not present in the local file index.
    #[error("'{name}' is not in the synced file index.\nRun `news-finder sync` to refresh it.")]
    FileNotIndexed { name: String },

    /// The indexed local path no longer exists.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, place it next to the binary, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory).\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── Drive errors ──────────────────────────────────────────────────────
    /// The drive rejected the access token (401/403).
    #[error("Google Drive rejected the access token: {detail}\nRefresh GOOGLE_DRIVE_TOKEN and retry.")]
    DriveAuth { detail: String },

    /// Any other non-success drive response.
    #[error("Google Drive API error (HTTP {status}): {message}")]
    DriveApi { status: u16, message: String },

    /// Transport-level failure while downloading a file.
    #[error("Failed to download '{name}': {reason}\nCheck your internet connection.")]
    DownloadFailed { name: String, reason: String },

    // ── Store errors ──────────────────────────────────────────────────────
    /// A persisted JSON map exists but cannot be parsed.
    #[error("Store '{path}' is corrupt: {detail}\nDelete it to start fresh.")]
    CorruptStore { path: PathBuf, detail: String },

    /// A persisted JSON map could not be written.
    #[error("Failed to write store '{path}': {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The model call failed.
    #[error("Page {page}: LLM call failed: {detail}")]
    LlmFailed { page: usize, detail: String },

    /// The model call timed out.
    #[error("Page {page}: LLM call timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_match_prompts() {
        assert_eq!(FinderError::NoFileSelected.to_string(), "Please select a file!");
        assert_eq!(FinderError::EmptyTag.to_string(), "Please enter a search tag!");
    }

    #[test]
    fn file_not_indexed_suggests_sync() {
        let e = FinderError::FileNotIndexed {
            name: "sandesh_2024-01-05.pdf".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("sandesh_2024-01-05.pdf"), "got: {msg}");
        assert!(msg.contains("news-finder sync"), "got: {msg}");
    }

    #[test]
    fn drive_api_display() {
        let e = FinderError::DriveApi {
            status: 500,
            message: "backend error".into(),
        };
        assert!(e.to_string().contains("HTTP 500"));
        assert!(e.to_string().contains("backend error"));
    }

    #[test]
    fn page_timeout_display() {
        let e = PageError::Timeout { page: 3, secs: 120 };
        assert!(e.to_string().contains("Page 3"));
        assert!(e.to_string().contains("120s"));
    }
}
