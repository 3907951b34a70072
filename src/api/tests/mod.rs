use super::*;
use crate::codec::RasterCodec;
use crate::fetch::HttpFetcher;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use std::io::{Cursor, Read};
use std::time::Duration;
use tower::ServiceExt;


const BOUNDARY: &str = "batch-media-test-boundary";

/// One multipart part: field name, optional filename, content
type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.fetch.timeout = Duration::from_secs(5);
    config
}

fn test_state(config: Config) -> AppState {
    AppState::new(Arc::new(config)).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn json_body(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn zip_entries(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut file = zip.by_index(i).unwrap();
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).unwrap();
            (file.name().to_string(), bytes)
        })
        .collect()
}

fn header<'a>(response: &'a Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn test_api_server_serves_and_shuts_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(serve(listener, test_state(test_config()), async move {
        let _ = stop_rx.await;
    }));

    let response = reqwest::Client::new()
        .get(format!("http://{address}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = test_config();
    config.server.cors_enabled = true;
    config.server.cors_origins = vec!["*".to_string()];
    let app = create_router(test_state(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = test_config();
    config.server.cors_enabled = false;
    let app = create_router(test_state(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_body_limit_rejects_oversized_upload() {
    let mut config = test_config();
    config.server.max_body_bytes = 1024;
    let app = create_router(test_state(config));

    let big = vec![0u8; 4096];
    let response = app
        .oneshot(multipart_request(
            "/api/compress",
            &[("files", Some("big.bin"), big.as_slice())],
        ))
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::PAYLOAD_TOO_LARGE
            || response.status() == StatusCode::BAD_REQUEST,
        "unexpected status {}",
        response.status()
    );
}

#[tokio::test]
async fn test_custom_components_are_used() {
    let state = AppState::with_components(
        Arc::new(test_config()),
        Arc::new(HttpFetcher::new(&test_config().fetch).unwrap()),
        Arc::new(RasterCodec::new()),
    );
    assert_eq!(state.fetcher.name(), "http");
    assert_eq!(state.codec.name(), "raster");
}
