mod common;

use common::{write_container, Fixture};
use glossary_core::{AppConfig, CatalogClient, CatalogError, ResourceService};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Serves `responses` in order, one per connection.
fn serve(responses: Vec<(u16, Vec<u8>)>) -> (SocketAddr, Arc<AtomicUsize>) {
    serve_with(|_| responses)
}

/// Like `serve`, for bodies that need the stub's own address.
fn serve_with(
    build: impl FnOnce(SocketAddr) -> Vec<(u16, Vec<u8>)>,
) -> (SocketAddr, Arc<AtomicUsize>) {
    serve_raw(|addr| {
        build(addr)
            .into_iter()
            .map(|(status, body)| http_reply(status, &body))
            .collect()
    })
}

fn http_reply(status: u16, body: &[u8]) -> Vec<u8> {
    let mut reply = format!(
        "HTTP/1.1 {status} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reason(status),
        body.len()
    )
    .into_bytes();
    reply.extend_from_slice(body);
    reply
}

/// Writes each raw reply verbatim and closes the connection; an empty
/// reply closes without answering.
fn serve_raw(build: impl FnOnce(SocketAddr) -> Vec<Vec<u8>>) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let replies = build(addr);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    thread::spawn(move || {
        for reply in replies {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            read_request_head(&mut stream);
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = stream.write_all(&reply);
            let _ = stream.flush();
        }
    });

    (addr, hits)
}

fn read_request_head(stream: &mut impl Read) {
    let mut head = Vec::new();
    let mut buf = [0_u8; 512];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(read) => head.extend_from_slice(&buf[..read]),
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn fast_config(base: &AppConfig, addr: SocketAddr) -> AppConfig {
    let mut config = base
        .clone()
        .with_catalog_url(format!("http://{addr}/catalog.json"));
    config.http_timeout = Duration::from_secs(5);
    config.retry_max_attempts = 3;
    config.retry_backoff_base = Duration::from_millis(1);
    config
}

fn stub_client(dir: &Path, addr: SocketAddr) -> CatalogClient {
    CatalogClient::new(&fast_config(&AppConfig::for_data_dir(dir), addr)).unwrap()
}

fn catalog_json(addr: SocketAddr) -> Vec<u8> {
    format!(
        r#"{{"languages":[{{"slug":"xyz","name":"Xyz Native","anglicized_name":"Xyz",
            "direction":"rtl","gateway":false,
            "resources":[{{"type":"ulb","version":"4","title":"Xyz ULB",
                           "url":"http://{addr}/xyz_ulb.zip"}}]}}]}}"#
    )
    .into_bytes()
}

#[test]
fn fetch_retries_server_errors_then_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, hits) = serve_with(|addr| {
        vec![
            (503, Vec::new()),
            (503, Vec::new()),
            (200, catalog_json(addr)),
        ]
    });

    let client = stub_client(dir.path(), addr);
    let catalog = client.fetch_catalog().unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    let (language, resource) = catalog.find("xyz", "ULB").unwrap();
    assert_eq!(language.anglicized_name, "Xyz");
    assert_eq!(resource.version, "4");
}

#[test]
fn fetch_gives_up_after_max_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, hits) = serve(vec![(500, Vec::new()); 5]);

    let client = stub_client(dir.path(), addr);
    let err = client.fetch_catalog().unwrap_err();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert!(matches!(err, CatalogError::Http { status: 500, .. }));
    assert_eq!(err.user_message(), "server error (HTTP 500)");
}

#[test]
fn client_errors_are_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, hits) = serve(vec![(404, Vec::new()), (200, b"{}".to_vec())]);

    let client = stub_client(dir.path(), addr);
    let err = client.fetch_catalog().unwrap_err();

    assert!(matches!(err, CatalogError::Http { status: 404, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn invalid_catalog_body_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _) = serve(vec![(200, b"<html>maintenance</html>".to_vec())]);

    let client = stub_client(dir.path(), addr);
    let err = client.fetch_catalog().unwrap_err();
    assert!(matches!(err, CatalogError::Decode(_)));
}

#[test]
fn unreachable_server_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = stub_client(dir.path(), addr);
    let err = client.fetch_catalog().unwrap_err();
    assert!(matches!(err, CatalogError::Io(_)));
    assert_eq!(err.user_message(), "network unavailable");
}

#[test]
fn dropped_connection_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, hits) = serve_raw(|addr| vec![Vec::new(), http_reply(200, &catalog_json(addr))]);

    let client = stub_client(dir.path(), addr);
    let err = client.fetch_catalog().unwrap_err();

    assert!(matches!(err, CatalogError::Io(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn truncated_download_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, hits) = serve_raw(|_| {
        vec![b"HTTP/1.1 200 OK\r\nContent-Length: 4096\r\nConnection: close\r\n\r\nPK\x03\x04 short".to_vec()]
    });
    let dest = dir.path().join("resources").join("xyz_ulb.zip");

    let client = stub_client(dir.path(), addr);
    let err = client
        .download(&format!("http://{addr}/xyz_ulb.zip"), &dest)
        .unwrap_err();

    assert!(matches!(err, CatalogError::Io(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!dest.exists());
    assert!(!dest.with_extension("part").exists());
}

#[test]
fn missing_catalog_url_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let client = CatalogClient::new(&AppConfig::for_data_dir(dir.path())).unwrap();
    assert_eq!(
        client.fetch_catalog().unwrap_err(),
        CatalogError::NotConfigured
    );
}

#[test]
fn install_downloads_and_registers_a_catalog_resource() {
    let fixture = Fixture::new();
    let container = fixture.scratch("xyz_source.zip");
    write_container(&container, "xyz", "4", "xyz_ulb/");
    let zip_bytes = std::fs::read(&container).unwrap();

    let (addr, hits) = serve_with(|addr| vec![(200, catalog_json(addr)), (200, zip_bytes)]);

    let config = fast_config(&fixture.config, addr);
    let client = CatalogClient::new(&config).unwrap();
    let catalog = client.fetch_catalog().unwrap();
    let (language, entry) = catalog.find("xyz", "ulb").unwrap();

    let resource = ResourceService::new(&fixture.conn, &config)
        .install_from_catalog(&client, language, entry)
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(resource.slug(), "xyz_ulb");
    assert_eq!(resource.version, "4");
    assert_eq!(resource.language.name, "Xyz Native");
    assert_eq!(resource.language.angle_name, "Xyz");
    assert!(config.resource_path(&resource.filename).is_file());
    assert!(!config.resources_dir.join("download_xyz_ulb.zip").exists());
    assert!(!config.resources_dir.join("download_xyz_ulb.part").exists());
}
