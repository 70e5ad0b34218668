//! `GoogleDriveClient` against a scripted local HTTP server.

use gujarati_news_finder::{DriveClient, DriveFile, FinderError, GoogleDriveClient};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Requests = Arc<Mutex<Vec<String>>>;

/// Serve `responses` in order, one per connection, recording each request head.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Requests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let seen: Requests = Arc::default();
    let log = seen.clone();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut sock, _) = listener.accept().await.unwrap();
            let head = read_request(&mut sock).await;
            log.lock().unwrap().push(head);

            let reply = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(reply.as_bytes()).await.unwrap();
            let _ = sock.shutdown().await;
        }
    });

    (base, seen)
}

/// Read headers plus any `Content-Length` body; returns the lowercased head.
async fn read_request(sock: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = sock.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < end + 4 + body_len {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            return head;
        }
    }
    String::from_utf8_lossy(&buf).to_lowercase()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn client(base: &str) -> GoogleDriveClient {
    GoogleDriveClient::new("test-token", base, 10).unwrap()
}

#[tokio::test]
async fn list_pdfs_follows_page_tokens() {
    let (base, seen) = serve(vec![
        (
            200,
            r#"{"nextPageToken":"tok2","files":[{"id":"1","name":"a.pdf"}]}"#,
        ),
        (200, r#"{"files":[{"id":"2","name":"b.pdf"}]}"#),
    ])
    .await;

    let files = client(&base).list_pdfs("folder-1").await.unwrap();
    assert_eq!(
        files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["a.pdf", "b.pdf"]
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].starts_with("get /drive/v3/files?"));
    assert!(seen[0].contains("authorization: bearer test-token"));
    assert!(!seen[0].contains("pagetoken="));
    assert!(seen[1].contains("pagetoken=tok2"));
}

#[tokio::test]
async fn find_folder_returns_none_when_empty() {
    let (base, _) = serve(vec![(200, r#"{"files":[]}"#)]).await;
    let found = client(&base).find_folder("GujaratiNewsFinder").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn create_folder_posts_metadata() {
    let (base, seen) = serve(vec![(200, r#"{"id":"new-id","name":"GujaratiNewsFinder"}"#)]).await;
    let folder = client(&base).create_folder("GujaratiNewsFinder").await.unwrap();

    assert_eq!(folder.id, "new-id");
    assert!(seen.lock().unwrap()[0].starts_with("post /drive/v3/files"));
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let (base, _) = serve(vec![(
        401,
        r#"{"error":{"code":401,"message":"Invalid Credentials"}}"#,
    )])
    .await;

    let err = client(&base).find_folder("x").await.unwrap_err();
    match err {
        FinderError::DriveAuth { detail } => assert_eq!(detail, "Invalid Credentials"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn server_error_keeps_status() {
    let (base, _) = serve(vec![(503, "busy")]).await;
    let err = client(&base).list_pdfs("f").await.unwrap_err();
    assert!(matches!(err, FinderError::DriveApi { status: 503, .. }));
}

#[tokio::test]
async fn download_writes_final_file_only() {
    let (base, seen) = serve(vec![(200, "%PDF-1.4 newspaper bytes")]).await;
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("sandesh.pdf");
    let file = DriveFile {
        id: "abc".into(),
        name: "sandesh.pdf".into(),
    };

    let written = client(&base).download(&file, &dest).await.unwrap();

    assert_eq!(written, 24);
    assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.4 newspaper bytes");
    assert!(!tmp.path().join("sandesh.pdf.part").exists());
    assert!(seen.lock().unwrap()[0].contains("/drive/v3/files/abc?alt=media"));
}
