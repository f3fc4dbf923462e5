use crate::server::{
    APP_KEY_COOKIE, EmbeddedServer, LoopbackServer, ReadyResponse, ServerError, build_router,
    mint_app_key,
};

use ks_config::ServerConfig;

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use googletest::assert_that;
use googletest::prelude::{eq, none, some};
use tempfile::TempDir;

const TEST_KEY: &str = "test-app-key";

fn content_root() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("index.html"), "<h1>hello</h1>").unwrap();
    temp
}

fn test_server(root: &TempDir) -> TestServer {
    let router = build_router(root.path().to_path_buf(), "/ready", TEST_KEY);
    TestServer::builder()
        .http_transport()
        .build(router)
        .expect("Failed to create test server")
}

// =========================================================================
// Router
// =========================================================================

#[tokio::test]
async fn given_no_cookie_when_get_ready_then_ok_with_version() {
    // Given
    let root = content_root();
    let server = test_server(&root);

    // When
    let response = server.get("/ready").await;

    // Then
    assert_that!(response.status_code(), eq(StatusCode::OK));
    let body: ReadyResponse = response.json();
    assert_that!(body.status, eq("ok"));
    assert_that!(body.version, eq(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn given_no_cookie_when_get_content_then_unauthorized() {
    // Given
    let root = content_root();
    let server = test_server(&root);

    // When
    let response = server.get("/index.html").await;

    // Then
    assert_that!(response.status_code(), eq(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn given_wrong_cookie_when_get_content_then_unauthorized() {
    // Given
    let root = content_root();
    let server = test_server(&root);

    // When
    let response = server
        .get("/index.html")
        .add_header(
            header::COOKIE,
            HeaderValue::from_static("app_key_cookie=guess"),
        )
        .await;

    // Then
    assert_that!(response.status_code(), eq(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn given_app_key_cookie_when_get_content_then_file_served() {
    // Given
    let root = content_root();
    let server = test_server(&root);

    // When
    let response = server
        .get("/index.html")
        .add_header(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; app_key_cookie=test-app-key"),
        )
        .await;

    // Then
    assert_that!(response.status_code(), eq(StatusCode::OK));
    assert_that!(response.text(), eq("<h1>hello</h1>"));
}

#[test]
fn given_mint_app_key_when_called_twice_then_distinct_hex_keys() {
    // When
    let first = mint_app_key();
    let second = mint_app_key();

    // Then
    assert_that!(first.len(), eq(32));
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(first != second);
}

// =========================================================================
// LoopbackServer
// =========================================================================

#[tokio::test]
async fn given_loopback_server_when_started_then_serves_with_cookie() {
    // Given
    let root = content_root();
    let mut server = LoopbackServer::new(&ServerConfig::default(), root.path().to_path_buf())
        .with_app_key(TEST_KEY);

    // When
    server.start().await.unwrap();

    // Then
    let url = server.url().unwrap();
    assert!(url.starts_with("http://127.0.0.1:"));
    assert_that!(server.app_key(), some(eq(TEST_KEY)));

    let body = reqwest::Client::new()
        .get(format!("{url}/index.html"))
        .header("cookie", format!("{APP_KEY_COOKIE}={TEST_KEY}"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_that!(body, eq("<h1>hello</h1>"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_running_loopback_when_stopped_then_url_cleared_and_port_released() {
    // Given
    let root = content_root();
    let mut server = LoopbackServer::new(&ServerConfig::default(), root.path().to_path_buf());
    server.start().await.unwrap();
    let addr = server.local_addr().unwrap();

    // When
    server.stop().await.unwrap();

    // Then
    assert_that!(server.url(), none());
    assert_that!(server.app_key(), none());
    assert!(std::net::TcpListener::bind(addr).is_ok());
}

#[tokio::test]
async fn given_running_loopback_when_started_again_then_already_started() {
    // Given
    let root = content_root();
    let mut server = LoopbackServer::new(&ServerConfig::default(), root.path().to_path_buf());
    server.start().await.unwrap();

    // When
    let result = server.start().await;

    // Then
    assert!(matches!(result, Err(ServerError::AlreadyStarted { .. })));
    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_busy_port_when_started_then_bind_error() {
    // Given
    let root = content_root();
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let config = ServerConfig {
        port: listener.local_addr().unwrap().port(),
        ..ServerConfig::default()
    };
    let mut server = LoopbackServer::new(&config, root.path().to_path_buf());

    // When
    let result = server.start().await;

    // Then
    assert!(matches!(result, Err(ServerError::Bind { .. })));
    assert_that!(server.url(), none());
}
