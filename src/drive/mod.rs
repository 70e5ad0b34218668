//! Cloud drive access and the once-per-session folder sync.
//!
//! ```text
//! find_folder ──▶ (create_folder) ──▶ list_pdfs ──▶ download missing ──▶ FileIndex
//! ```
//!
//! [`DriveClient`] is the seam between the sync logic and the remote API.
//! [`GoogleDriveClient`] talks to Google Drive v3; tests substitute an
//! in-memory drive.

pub mod google;
pub mod sync;

pub use google::GoogleDriveClient;
pub use sync::{local_path_for, sync_folder, sync_once, SyncReport};

use crate::error::FinderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// MIME type Google Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type of the files mirrored by sync.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A remote file or folder, identified by its drive id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,
    /// Display name (the Drive "title").
    pub name: String,
}

/// Remote storage operations needed by [`sync_folder`].
#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Look up a non-trashed folder by exact name.
    async fn find_folder(&self, name: &str) -> Result<Option<DriveFile>, FinderError>;

    /// Create a folder at the drive root.
    async fn create_folder(&self, name: &str) -> Result<DriveFile, FinderError>;

    /// List every non-trashed PDF directly inside `folder_id`.
    async fn list_pdfs(&self, folder_id: &str) -> Result<Vec<DriveFile>, FinderError>;

    /// Download a file's content to `dest`, returning the byte count.
    async fn download(&self, file: &DriveFile, dest: &Path) -> Result<u64, FinderError>;
}
