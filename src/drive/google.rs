//! Google Drive v3 REST client.
//!
//! Only the four calls sync needs are implemented: folder lookup, folder
//! creation, PDF listing (with `nextPageToken` pagination) and media
//! download. Authentication is a pre-issued OAuth bearer token; obtaining
//! or refreshing it is left to the caller.

use super::{DriveClient, DriveFile, FOLDER_MIME_TYPE, PDF_MIME_TYPE};
use crate::config::FinderConfig;
use crate::error::FinderError;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Fields requested on every listing call.
const LIST_FIELDS: &str = "nextPageToken,files(id,name)";

/// Drive client authenticated with a bearer token.
pub struct GoogleDriveClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

impl GoogleDriveClient {
    pub fn new(
        token: impl Into<String>,
        api_base: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, FinderError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FinderError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Build a client from the configured token and endpoint.
    pub fn from_config(config: &FinderConfig) -> Result<Self, FinderError> {
        let token = config
            .drive_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| FinderError::DriveAuth {
                detail: "no access token configured (set GOOGLE_DRIVE_TOKEN)".into(),
            })?;
        Self::new(token, &config.drive_api_base, config.download_timeout_secs)
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.api_base)
    }

    /// Run one `files.list` query page.
    async fn list_page(&self, q: &str, page_token: Option<&str>) -> Result<FileList, FinderError> {
        let mut params = vec![
            ("q", q),
            ("fields", LIST_FIELDS),
            ("pageSize", "1000"),
            ("spaces", "drive"),
        ];
        if let Some(t) = page_token {
            params.push(("pageToken", t));
        }

        let resp = self
            .http
            .get(self.files_url())
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(resp)
            .await?
            .json::<FileList>()
            .await
            .map_err(transport_error)
    }
}

#[async_trait]
impl DriveClient for GoogleDriveClient {
    async fn find_folder(&self, name: &str) -> Result<Option<DriveFile>, FinderError> {
        let q = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            escape_query(name),
            FOLDER_MIME_TYPE
        );
        let list = self.list_page(&q, None).await?;
        Ok(list.files.into_iter().next())
    }

    async fn create_folder(&self, name: &str) -> Result<DriveFile, FinderError> {
        info!("Creating drive folder '{}'", name);
        let body = serde_json::json!({ "name": name, "mimeType": FOLDER_MIME_TYPE });

        let resp = self
            .http
            .post(self.files_url())
            .bearer_auth(&self.token)
            .query(&[("fields", "id,name")])
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(resp)
            .await?
            .json::<DriveFile>()
            .await
            .map_err(transport_error)
    }

    async fn list_pdfs(&self, folder_id: &str) -> Result<Vec<DriveFile>, FinderError> {
        let q = format!(
            "'{}' in parents and mimeType='{}' and trashed=false",
            escape_query(folder_id),
            PDF_MIME_TYPE
        );

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(&q, page_token.as_deref()).await?;
            debug!("Listed {} files (more: {})", page.files.len(), page.next_page_token.is_some());
            files.extend(page.files);
            match page.next_page_token {
                Some(t) if !t.is_empty() => page_token = Some(t),
                _ => break,
            }
        }
        Ok(files)
    }

    async fn download(&self, file: &DriveFile, dest: &Path) -> Result<u64, FinderError> {
        let download_err = |reason: String| FinderError::DownloadFailed {
            name: file.name.clone(),
            reason,
        };

        let resp = self
            .http
            .get(format!("{}/{}", self.files_url(), file.id))
            .bearer_auth(&self.token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| download_err(e.to_string()))?;
        let resp = check_status(resp).await?;

        // Stream into `<dest>.part`, renamed once complete.
        let part = part_path(dest);
        let out = tokio::fs::File::create(&part)
            .await
            .map_err(|e| download_err(format!("create {}: {e}", part.display())))?;

        let written = write_part(resp.bytes_stream(), out, &part)
            .await
            .map_err(download_err)?;

        if let Err(e) = tokio::fs::rename(&part, dest).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(download_err(format!("rename to {}: {e}", dest.display())));
        }

        Ok(written)
    }
}

/// Copy `body` into `out` and flush. `part` is removed on any failure.
async fn write_part<S, B, E>(
    body: S,
    mut out: tokio::fs::File,
    part: &Path,
) -> Result<u64, String>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let result = async {
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            let bytes = chunk.as_ref();
            out.write_all(bytes).await.map_err(|e| e.to_string())?;
            written += bytes.len() as u64;
        }
        out.flush().await.map_err(|e| e.to_string())?;
        Ok::<u64, String>(written)
    }
    .await;
    drop(out);

    if result.is_err() {
        let _ = tokio::fs::remove_file(part).await;
    }
    result
}

/// Escape a value for use inside a single-quoted Drive query literal.
pub fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn part_path(dest: &Path) -> std::path::PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

fn transport_error(e: reqwest::Error) -> FinderError {
    FinderError::DriveApi {
        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        message: e.to_string(),
    }
}

/// Turn non-2xx responses into typed errors, keeping Drive's own message.
async fn check_status(resp: Response) -> Result<Response, FinderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = extract_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(FinderError::DriveAuth { detail: message })
        }
        _ => Err(FinderError::DriveApi {
            status: status.as_u16(),
            message,
        }),
    }
}

/// Pull `error.message` out of a Drive error body.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_query("Gujarati News"), "Gujarati News");
        assert_eq!(escape_query("Reader's Digest"), "Reader\\'s Digest");
        assert_eq!(escape_query("a\\b"), "a\\\\b");
    }

    #[test]
    fn error_message_extraction() {
        let body = r#"{"error":{"code":404,"message":"File not found: abc."}}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("File not found: abc."));
        assert_eq!(extract_error_message("<html>oops</html>"), None);
    }

    #[test]
    fn file_list_parses_pagination() {
        let json = r#"{"nextPageToken":"tok2","files":[{"id":"1","name":"a.pdf"}]}"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.next_page_token.as_deref(), Some("tok2"));
        assert_eq!(list.files[0].name, "a.pdf");

        let last: FileList = serde_json::from_str("{}").unwrap();
        assert!(last.files.is_empty());
        assert!(last.next_page_token.is_none());
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/x/pdfs/sandesh.pdf")),
            Path::new("/x/pdfs/sandesh.pdf.part")
        );
    }

    #[test]
    fn from_config_requires_token() {
        let config = FinderConfig::default();
        let err = GoogleDriveClient::from_config(&config).err().unwrap();
        assert!(matches!(err, FinderError::DriveAuth { .. }));
    }

    #[tokio::test]
    async fn stream_error_removes_part_file() {
        let tmp = tempfile::tempdir().unwrap();
        let part = tmp.path().join("sandesh.pdf.part");
        let out = tokio::fs::File::create(&part).await.unwrap();
        let body = futures::stream::iter(vec![
            Ok(b"%PDF-1.4".to_vec()),
            Err("connection reset"),
        ]);

        let err = write_part(body, out, &part).await.unwrap_err();
        assert_eq!(err, "connection reset");
        assert!(!part.exists());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn write_error_removes_part_file() {
        let tmp = tempfile::tempdir().unwrap();
        let part = tmp.path().join("sandesh.pdf.part");
        std::fs::write(&part, b"").unwrap();
        // Writes to /dev/full fail with ENOSPC.
        let out = tokio::fs::OpenOptions::new()
            .write(true)
            .open("/dev/full")
            .await
            .unwrap();
        let body = futures::stream::iter(vec![Ok::<_, String>(vec![0u8; 64 * 1024])]);

        assert!(write_part(body, out, &part).await.is_err());
        assert!(!part.exists());
    }

    #[tokio::test]
    async fn complete_stream_keeps_part_file() {
        let tmp = tempfile::tempdir().unwrap();
        let part = tmp.path().join("sandesh.pdf.part");
        let out = tokio::fs::File::create(&part).await.unwrap();
        let body = futures::stream::iter(vec![
            Ok::<_, String>(b"%PDF".to_vec()),
            Ok(b"-1.4".to_vec()),
        ]);

        assert_eq!(write_part(body, out, &part).await.unwrap(), 8);
        assert_eq!(std::fs::read(&part).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn files_url_trims_trailing_slash() {
        let client = GoogleDriveClient::new("t", "http://localhost:9/", 5).unwrap();
        assert_eq!(client.files_url(), "http://localhost:9/drive/v3/files");
    }
}
