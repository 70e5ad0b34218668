//! Mirror the remote newspaper folder into the local PDF directory.
//!
//! Sync is idempotent at the file-existence level only: a file is
//! downloaded when nothing exists at its local path, and never otherwise.
//! Remote edits, deletions and renames are not detected.

use super::{DriveClient, DriveFile};
use crate::config::FinderConfig;
use crate::error::FinderError;
use crate::store::FileIndex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a sync pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub folder_id: String,
    /// Display names of every PDF found in the folder.
    pub files: Vec<String>,
    pub downloaded: usize,
    pub already_present: usize,
}

/// Look up the app folder by name, creating it when absent.
pub async fn get_or_create_folder<D>(drive: &D, name: &str) -> Result<DriveFile, FinderError>
where
    D: DriveClient + ?Sized,
{
    match drive.find_folder(name).await? {
        Some(folder) => {
            debug!("Found drive folder '{}' ({})", name, folder.id);
            Ok(folder)
        }
        None => drive.create_folder(name).await,
    }
}

/// Local mirror path for a remote display name.
///
/// Path separators in the display name are replaced so every file lands
/// directly inside `pdf_dir`.
pub fn local_path_for(pdf_dir: &Path, display_name: &str) -> PathBuf {
    let safe: String = display_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    pdf_dir.join(safe)
}

/// List the folder's PDFs, download the missing ones and rebuild the index.
///
/// The index is saved once, after every file has been handled.
pub async fn sync_folder<D>(
    drive: &D,
    index: &mut FileIndex,
    pdf_dir: &Path,
    folder_name: &str,
) -> Result<SyncReport, FinderError>
where
    D: DriveClient + ?Sized,
{
    tokio::fs::create_dir_all(pdf_dir)
        .await
        .map_err(|e| FinderError::StoreWrite {
            path: pdf_dir.to_path_buf(),
            source: e,
        })?;

    let folder = get_or_create_folder(drive, folder_name).await?;
    let remote = drive.list_pdfs(&folder.id).await?;
    info!("Drive folder '{}' holds {} PDFs", folder_name, remote.len());

    let mut report = SyncReport {
        folder_id: folder.id.clone(),
        ..Default::default()
    };

    for file in &remote {
        let local = local_path_for(pdf_dir, &file.name);
        if tokio::fs::try_exists(&local).await.unwrap_or(false) {
            debug!("Already present: {}", local.display());
            report.already_present += 1;
        } else {
            let bytes = drive.download(file, &local).await?;
            info!("Downloaded '{}' ({} bytes)", file.name, bytes);
            report.downloaded += 1;
        }
        index.insert(file.name.clone(), local);
        report.files.push(file.name.clone());
    }

    index.save()?;
    Ok(report)
}

/// Session guard around [`sync_folder`].
///
/// Returns `Ok(None)` without touching the network when the index already
/// lists files, unless `force` is set.
pub async fn sync_once<D>(
    drive: &D,
    index: &mut FileIndex,
    config: &FinderConfig,
    force: bool,
) -> Result<Option<SyncReport>, FinderError>
where
    D: DriveClient + ?Sized,
{
    if !force && !index.is_empty() {
        debug!("File index already populated ({} files); skipping sync", index.len());
        return Ok(None);
    }
    sync_folder(drive, index, &config.pdf_dir(), &config.folder_name)
        .await
        .map(Some)
}
