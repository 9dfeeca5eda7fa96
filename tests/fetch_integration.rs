//! Integration tests for the fetch pipeline.
//!
//! These tests run the full search -> detail -> download flow against mock
//! registry servers.

use std::path::Path;
use std::time::{Duration, Instant};

use doc_fetcher::models::{DocumentLink, ScraperConfiguration};
use doc_fetcher::pipeline::DocumentFetcher;
use doc_fetcher::services::{Downloader, RegistryClient};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

fn search_page(rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .enumerate()
        .map(|(i, (name, href))| {
            format!(
                r#"<tr><td><a href="{href}">{name}</a></td><td>{:07}</td><td>Current-Active</td><td>2020-06-15</td></tr>"#,
                i + 1
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <table class="searchResults">
          <tr><th>Name</th><th>SOSID</th><th>Status</th><th>Date Formed</th></tr>
          {rows}
        </table>
        </body></html>"#
    )
}

fn detail_page(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">Filing</a></li>"#))
        .collect();
    format!("<html><body><ul>{anchors}</ul><a href=\"/help.html\">Help</a></body></html>")
}

fn test_config(server: &MockServer, storage: &Path) -> ScraperConfiguration {
    ScraperConfiguration {
        target_base_url: server.uri(),
        search_endpoint: "/search".into(),
        storage_directory: storage.to_path_buf(),
        request_delay_seconds: 0.0,
        connection_timeout: 1,
        max_retry_attempts: 1,
        retry_backoff_seconds: 0.0,
        ..ScraperConfiguration::default()
    }
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_pdf(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(PDF_BYTES.to_vec()),
        )
        .mount(server)
        .await;
}

fn stored_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("storage directory should exist")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Serve one PDF as `chunks` copies of [`PDF_BYTES`], pausing `gap` before
/// each. With `stall_after`, the connection goes quiet for `stall` after that
/// many chunks and is then dropped.
async fn serve_chunked_pdf(
    chunks: usize,
    gap: Duration,
    stall_after: Option<(usize, Duration)>,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let header = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            PDF_BYTES.len() * chunks
        );
        socket.write_all(header.as_bytes()).await.unwrap();
        for sent in 0..chunks {
            if let Some((after, stall)) = stall_after {
                if sent == after {
                    tokio::time::sleep(stall).await;
                    return;
                }
            }
            tokio::time::sleep(gap).await;
            if socket.write_all(PDF_BYTES).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
        }
    });

    format!("http://{addr}/docs/slow.pdf")
}

#[tokio::test]
async fn test_slow_steady_download_outlasts_timeout() {
    // 8 chunks 300ms apart: 2.4s in total, never idle for the 1s timeout
    let url = serve_chunked_pdf(8, Duration::from_millis(300), None).await;

    let tmp = TempDir::new().unwrap();
    let config = ScraperConfiguration {
        storage_directory: tmp.path().to_path_buf(),
        request_delay_seconds: 0.0,
        retry_backoff_seconds: 0.0,
        connection_timeout: 1,
        ..ScraperConfiguration::default()
    };
    let mut client = RegistryClient::new(&config).unwrap();

    let path = Downloader::new()
        .download(&mut client, &DocumentLink::new(url, "Acme Inc"), tmp.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&path).unwrap().len(), PDF_BYTES.len() * 8);
    assert_eq!(stored_files(tmp.path()).len(), 1);
}

#[tokio::test]
async fn test_stalled_download_fails_without_leftovers() {
    let url = serve_chunked_pdf(
        8,
        Duration::from_millis(50),
        Some((2, Duration::from_secs(3))),
    )
    .await;

    let tmp = TempDir::new().unwrap();
    let config = ScraperConfiguration {
        storage_directory: tmp.path().to_path_buf(),
        request_delay_seconds: 0.0,
        retry_backoff_seconds: 0.0,
        connection_timeout: 1,
        ..ScraperConfiguration::default()
    };
    let mut client = RegistryClient::new(&config).unwrap();

    let result = Downloader::new()
        .download(&mut client, &DocumentLink::new(url, "Acme Inc"), tmp.path())
        .await;

    assert!(result.is_err());
    assert!(stored_files(tmp.path()).is_empty(), "no partial files may remain");
}

#[tokio::test]
async fn test_single_business_two_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("Words", "Acme Inc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&[("Acme Inc", "/detail/123")])),
        )
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/detail/123",
        detail_page(&["/docs/annual-2023.pdf", "/docs/articles.PDF", "/docs/annual-2023.pdf"]),
    )
    .await;
    mount_pdf(&server, "/docs/annual-2023.pdf").await;
    mount_pdf(&server, "/docs/articles.PDF").await;

    let tmp = TempDir::new().unwrap();
    let storage = tmp.path().join("docs");
    let mut fetcher = DocumentFetcher::new(test_config(&server, &storage)).unwrap();

    let result = fetcher.process_search_and_download("Acme Inc").await.unwrap();
    fetcher.close();

    assert_eq!(result.search_query, "Acme Inc");
    assert_eq!(result.businesses_found, 1);
    assert_eq!(result.documents_downloaded, 2);
    assert!(result.failures.is_empty(), "unexpected failures: {:?}", result.failures);

    let files = stored_files(&storage);
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.starts_with("Acme Inc_") && f.ends_with(".pdf")));
    for path in &result.downloaded_files {
        assert_eq!(std::fs::read(path).unwrap(), PDF_BYTES);
    }
}

#[tokio::test]
async fn test_search_timeout_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(2)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let storage = tmp.path().join("docs");
    let mut fetcher = DocumentFetcher::new(test_config(&server, &storage)).unwrap();

    let result = fetcher.process_search_and_download("Acme Inc").await.unwrap();
    fetcher.close();

    assert_eq!(result.businesses_found, 0);
    assert_eq!(result.documents_downloaded, 0);
    assert_eq!(result.failures.len(), 1);
    assert!(
        result.failures[0].contains("timed out"),
        "failure should describe the timeout: {}",
        result.failures[0]
    );
    assert!(stored_files(&storage).is_empty());
}

#[tokio::test]
async fn test_missing_document_does_not_stop_others() {
    let server = MockServer::start().await;
    mount_html(&server, "/search", search_page(&[("Acme Inc", "/detail/123")])).await;
    mount_html(
        &server,
        "/detail/123",
        detail_page(&["/docs/gone.pdf", "/docs/present.pdf"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_pdf(&server, "/docs/present.pdf").await;

    let tmp = TempDir::new().unwrap();
    let storage = tmp.path().join("docs");
    let mut fetcher = DocumentFetcher::new(test_config(&server, &storage)).unwrap();

    let result = fetcher.process_search_and_download("Acme Inc").await.unwrap();
    fetcher.close();

    assert_eq!(result.businesses_found, 1);
    assert_eq!(result.documents_downloaded, 1);
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].contains("gone.pdf"));
    assert!(result.failures[0].contains("404"));
    assert_eq!(stored_files(&storage).len(), 1);
}

#[tokio::test]
async fn test_non_pdf_and_empty_bodies_are_rejected() {
    let server = MockServer::start().await;
    mount_html(&server, "/search", search_page(&[("Acme Inc", "/detail/123")])).await;
    mount_html(
        &server,
        "/detail/123",
        detail_page(&["/docs/login.pdf", "/docs/empty.pdf"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/login.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>Please sign in</html>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/empty.pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let storage = tmp.path().join("docs");
    let mut fetcher = DocumentFetcher::new(test_config(&server, &storage)).unwrap();

    let result = fetcher.process_search_and_download("Acme Inc").await.unwrap();
    fetcher.close();

    assert_eq!(result.documents_downloaded, 0);
    assert_eq!(result.failures.len(), 2);
    assert!(result.failures[0].contains("not a PDF"));
    assert!(result.failures[1].contains("empty response body"));
    assert!(stored_files(&storage).is_empty(), "no partial files may remain");
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_html(&server, "/search", search_page(&[])).await;

    let tmp = TempDir::new().unwrap();
    let mut fetcher = DocumentFetcher::new(test_config(&server, tmp.path())).unwrap();

    let result = fetcher.process_search_and_download("Nobody").await.unwrap();
    fetcher.close();

    assert_eq!(result.businesses_found, 0);
    assert!(result.failures.is_empty(), "retry should have recovered: {:?}", result.failures);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = ScraperConfiguration {
        max_retry_attempts: 3,
        ..test_config(&server, tmp.path())
    };
    let mut fetcher = DocumentFetcher::new(config).unwrap();

    let result = fetcher.process_search_and_download("Acme").await.unwrap();
    fetcher.close();

    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].contains("403"));
}

#[tokio::test]
async fn test_failed_detail_page_does_not_stop_other_businesses() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/search",
        search_page(&[("Broken Co", "/detail/1"), ("Working Co", "/detail/2")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    mount_html(&server, "/detail/2", detail_page(&["/docs/w.pdf"])).await;
    mount_pdf(&server, "/docs/w.pdf").await;

    let tmp = TempDir::new().unwrap();
    let storage = tmp.path().join("docs");
    let mut fetcher = DocumentFetcher::new(test_config(&server, &storage)).unwrap();

    let result = fetcher.process_search_and_download("Co").await.unwrap();
    fetcher.close();

    assert_eq!(result.businesses_found, 2);
    assert_eq!(result.documents_downloaded, 1);
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].contains("Broken Co"));
    assert_eq!(stored_files(&storage).len(), 1);
}

#[tokio::test]
async fn test_no_results_page_is_not_an_error() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/search",
        "<html><body><p>No records found.</p></body></html>".to_string(),
    )
    .await;

    let tmp = TempDir::new().unwrap();
    let mut fetcher = DocumentFetcher::new(test_config(&server, tmp.path())).unwrap();

    let result = fetcher.process_search_and_download("Nonexistent").await.unwrap();
    fetcher.close();

    assert_eq!(result.businesses_found, 0);
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn test_delay_precedes_every_request() {
    let server = MockServer::start().await;
    mount_html(&server, "/search", search_page(&[("Acme Inc", "/detail/123")])).await;
    mount_html(&server, "/detail/123", detail_page(&["/docs/a.pdf"])).await;
    mount_pdf(&server, "/docs/a.pdf").await;

    let tmp = TempDir::new().unwrap();
    let config = ScraperConfiguration {
        request_delay_seconds: 0.2,
        delay_first_request: true,
        ..test_config(&server, tmp.path())
    };
    let mut fetcher = DocumentFetcher::new(config).unwrap();

    let started = Instant::now();
    let result = fetcher.process_search_and_download("Acme Inc").await.unwrap();
    fetcher.close();

    assert_eq!(result.documents_downloaded, 1);
    // search + detail + download, each paced
    assert!(started.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn test_close_twice_and_reuse_after_close() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let mut fetcher = DocumentFetcher::new(test_config(&server, tmp.path())).unwrap();

    fetcher.close();
    fetcher.close();

    assert!(fetcher.is_closed());
    assert!(fetcher.process_search_and_download("Acme").await.is_err());
}
