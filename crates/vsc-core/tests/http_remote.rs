//! HTTP transport against a throwaway stub server

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::{tempdir, TempDir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use vsc_core::{
    BatchError, HttpRemote, PushOptions, ServerAddress, SyncClient, SyncError, TransferError,
};

/// A request as received by the stub
#[derive(Debug, Clone)]
struct Recorded {
    request_line: String,
    raw: Vec<u8>,
}

impl Recorded {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

type Route = fn(&str) -> (u16, String);

/// Start a stub answering every request through `route`
async fn start_stub(route: Route) -> (ServerAddress, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));

    let log = recorded.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let raw = read_request(&mut stream).await;
            let request_line = String::from_utf8_lossy(&raw)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();

            let (status, body) = route(&request_line);
            log.lock().unwrap().push(Recorded { request_line, raw });

            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                if status == 200 { "OK" } else { "Error" },
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    let address = ServerAddress::from_host(&addr.to_string()).unwrap();
    (address, recorded)
}

async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return buf;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());
    let chunked = headers.contains("transfer-encoding: chunked");

    loop {
        let complete = match content_length {
            Some(len) => buf.len() >= header_end + len,
            None if chunked => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            return buf;
        }
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return buf;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn client_for(address: &ServerAddress) -> SyncClient<HttpRemote> {
    SyncClient::new(HttpRemote::new(address, Some(Duration::from_secs(10))).unwrap())
}

/// `<tmp>/root/{a.txt, sub/b.txt}`
fn sample_tree() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), b"alpha").unwrap();
    fs::write(root.join("sub").join("b.txt"), b"beta").unwrap();
    (dir, root)
}

fn accept_everything(_: &str) -> (u16, String) {
    (200, String::new())
}

#[tokio::test]
async fn test_push_posts_one_multipart_form_per_directory() {
    let (address, recorded) = start_stub(accept_everything).await;
    let (_dir, root) = sample_tree();

    let report = client_for(&address)
        .push_tree(&root, PushOptions::default())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.batches_sent, 2);

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.request_line, "POST /files/push HTTP/1.1");
        assert!(request.text().to_lowercase().contains("multipart/form-data"));
    }

    let first = requests[0].text();
    assert!(first.contains("name=\"directory_name\"\r\n\r\nroot\r\n"));
    assert!(first.contains("name=\"files\"; filename=\"a.txt\""));
    assert!(first.contains("alpha"));

    let second = requests[1].text();
    assert!(second.contains("name=\"directory_name\"\r\n\r\nroot\\sub\r\n"));
    assert!(second.contains("name=\"files\"; filename=\"b.txt\""));
    assert!(second.contains("beta"));
}

#[tokio::test]
async fn test_pull_materializes_numeric_byte_arrays() {
    fn route(request_line: &str) -> (u16, String) {
        assert_eq!(request_line, "GET /files/pull/root HTTP/1.1");
        (
            200,
            r#"[{"name":"root\\a.txt","file":[97,108,112,104,97]},{"name":"root\\sub\\b.txt","file":[98,101,116,97]}]"#
                .to_string(),
        )
    }
    let (address, _recorded) = start_stub(route).await;
    let dest = tempdir().unwrap();

    let report = client_for(&address)
        .pull_tree("root", dest.path())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(fs::read(dest.path().join("root").join("a.txt")).unwrap(), b"alpha");
    assert_eq!(
        fs::read(dest.path().join("root").join("sub").join("b.txt")).unwrap(),
        b"beta"
    );
}

#[tokio::test]
async fn test_pull_with_malformed_body_writes_nothing() {
    fn route(_: &str) -> (u16, String) {
        (200, r#"[{"name":"root\\a.txt","file":[1]},{"oops":true}]"#.to_string())
    }
    let (address, _recorded) = start_stub(route).await;
    let dest = tempdir().unwrap();

    let err = client_for(&address)
        .pull_tree("root", dest.path())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Transfer(TransferError::Protocol { .. })
    ));
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_list_preserves_order_and_duplicates() {
    fn route(request_line: &str) -> (u16, String) {
        assert_eq!(request_line, "GET /files/all HTTP/1.1");
        (
            200,
            r#"{"repositoriesNames":["photos","docs","photos"]}"#.to_string(),
        )
    }
    let (address, _recorded) = start_stub(route).await;

    let list = client_for(&address).list_remote().await.unwrap();
    assert_eq!(list.names, ["photos", "docs", "photos"]);
}

#[tokio::test]
async fn test_server_error_status_is_reported() {
    fn route(_: &str) -> (u16, String) {
        (500, String::new())
    }
    let (address, _recorded) = start_stub(route).await;

    let err = client_for(&address).list_remote().await.unwrap_err();
    match err {
        SyncError::Transfer(TransferError::Status { status, .. }) => {
            assert_eq!(status.as_u16(), 500)
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_fails_every_batch_but_walks_them_all() {
    // Grab a free port, then close it
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let address = ServerAddress::from_host(&addr.to_string()).unwrap();
    let (_dir, root) = sample_tree();

    let report = client_for(&address)
        .push_tree(&root, PushOptions::default())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.batches_sent, 0);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| matches!(
        f.error,
        BatchError::Transfer(TransferError::Transport { .. })
    )));
}
