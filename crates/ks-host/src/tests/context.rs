use crate::context::HostContext;
use crate::control::{ControlClient, SessionUpdate};
use crate::error::HostError;
use crate::tests::{Entry, FAKE_URL, FakeCounters, FakeServer, build_archive};

use ks_config::Config;

use std::sync::Arc;
use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{eq, none, some};
use tempfile::TempDir;

fn context(temp: &TempDir, configure: impl FnOnce(&mut FakeServer)) -> (HostContext, Arc<FakeCounters>) {
    let counters = Arc::new(FakeCounters::default());
    let mut server = FakeServer::new(counters.clone());
    configure(&mut server);

    let context = HostContext::with_server_factory(Config::default(), temp.path(), server.factory());
    (context, counters)
}

// =========================================================================
// HostContext - Binding Count
// =========================================================================

#[tokio::test]
async fn given_first_binding_when_bind_then_server_activated() {
    // Given
    let temp = TempDir::new().unwrap();
    let (context, counters) = context(&temp, |_| {});

    // When
    context.bind().await.unwrap();

    // Then
    assert_that!(context.binding_count().await, eq(1));
    assert_that!(counters.starts(), eq(1));
    assert!(context.home_dir().join("layout.json").is_file());
    assert!(context.content_dir().join("storage").is_dir());
}

#[tokio::test]
async fn given_two_bindings_when_one_unbinds_then_server_keeps_running() {
    // Given
    let temp = TempDir::new().unwrap();
    let (context, counters) = context(&temp, |_| {});
    context.bind().await.unwrap();
    context.bind().await.unwrap();

    // When
    context.unbind().await.unwrap();

    // Then
    assert_that!(context.binding_count().await, eq(1));
    assert_that!(counters.starts(), eq(1));
    assert_that!(counters.stops(), eq(0));
    assert!(context.server_data().is_some());
}

#[tokio::test]
async fn given_last_binding_when_unbind_then_server_deactivated() {
    // Given
    let temp = TempDir::new().unwrap();
    let (context, counters) = context(&temp, |_| {});
    context.bind().await.unwrap();

    // When
    context.unbind().await.unwrap();

    // Then
    assert_that!(context.binding_count().await, eq(0));
    assert_that!(counters.stops(), eq(1));
    assert_that!(context.server_data(), none());
}

#[tokio::test]
async fn given_failing_server_when_bind_then_count_unchanged() {
    // Given
    let temp = TempDir::new().unwrap();
    let (context, _counters) = context(&temp, |server| server.fail_start = true);

    // When
    let result = context.bind().await;

    // Then
    assert!(matches!(result, Err(HostError::Server(_))));
    assert_that!(context.binding_count().await, eq(0));
}

#[tokio::test]
async fn given_no_binding_when_unbind_then_noop() {
    // Given
    let temp = TempDir::new().unwrap();
    let (context, counters) = context(&temp, |_| {});

    // When
    let result = context.unbind().await;

    // Then
    assert!(result.is_ok());
    assert_that!(counters.stops(), eq(0));
}

#[tokio::test]
async fn given_bound_channel_when_client_requests_then_receives_server_data() {
    // Given
    let temp = TempDir::new().unwrap();
    let (context, _counters) = context(&temp, |_| {});
    let channel = context.bind().await.unwrap();
    let mut client = ControlClient::new(|_: &SessionUpdate| {});

    // When
    client.bind(&channel, 11).await.unwrap();
    let data = client.wait_ready(Duration::from_secs(2)).await.unwrap();

    // Then
    assert_that!(data.server_url, eq(FAKE_URL));
    assert_that!(context.server_data(), some(eq(&data)));
}

#[tokio::test]
async fn given_running_context_when_shutdown_then_server_stopped_and_channel_closed() {
    // Given
    let temp = TempDir::new().unwrap();
    let (context, counters) = context(&temp, |_| {});
    context.bind().await.unwrap();

    // When
    context.shutdown().await.unwrap();

    // Then
    assert_that!(counters.stops(), eq(1));
    assert_that!(context.binding_count().await, eq(0));
    assert!(context.channel().is_closed());
}

// =========================================================================
// HostContext - Import
// =========================================================================

#[tokio::test]
async fn given_archive_when_import_file_without_destination_then_lands_in_content_dir() {
    // Given
    let temp = TempDir::new().unwrap();
    let (context, _counters) = context(&temp, |_| {});
    let archive_path = temp.path().join("bundle.zip");
    std::fs::write(
        &archive_path,
        build_archive(&[Entry::File("content/readme.txt", b"read me")]),
    )
    .unwrap();

    // When
    let stats = context.import_file(&archive_path, None).await.unwrap();

    // Then
    assert_that!(stats.files_written, eq(1));
    assert!(context.content_dir().join("readme.txt").is_file());
}

#[tokio::test]
async fn given_fresh_context_when_initialize_then_layout_created_without_server() {
    // Given
    let temp = TempDir::new().unwrap();
    let (context, counters) = context(&temp, |_| {});

    // When
    context.initialize().await.unwrap();

    // Then
    assert!(context.home_dir().join("logs").is_dir());
    assert_that!(counters.starts(), eq(0));
}
