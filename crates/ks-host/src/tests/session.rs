use crate::control::{BrowserSession, ControlError};
use crate::server::ServerData;

use googletest::assert_that;
use googletest::prelude::eq;

fn data(server_url: &str, app_key: &str) -> ServerData {
    ServerData {
        server_url: String::from(server_url),
        app_key: String::from(app_key),
    }
}

// =========================================================================
// BrowserSession
// =========================================================================

#[test]
fn given_new_session_when_update_for_then_navigates_to_root() {
    // Given
    let session = BrowserSession::new();

    // When
    let update = session
        .update_for(&data("http://127.0.0.1:8123", "k3y"))
        .unwrap();

    // Then
    assert_that!(update.cookie_url, eq("http://127.0.0.1:8123"));
    assert_that!(update.cookie, eq("app_key_cookie=k3y"));
    assert_that!(update.navigate_to, eq("http://127.0.0.1:8123/"));
}

#[test]
fn given_remembered_path_when_update_for_new_port_then_path_kept() {
    // Given
    let mut session = BrowserSession::new();
    session.remember("http://127.0.0.1:8123/notes/today#top");

    // When
    let update = session
        .update_for(&data("http://127.0.0.1:9001", "k3y"))
        .unwrap();

    // Then
    assert_that!(update.navigate_to, eq("http://127.0.0.1:9001/notes/today#top"));
}

#[test]
fn given_unparsable_url_when_remember_then_previous_path_kept() {
    // Given
    let mut session = BrowserSession::new();
    session.remember("http://127.0.0.1:8123/a");

    // When
    session.remember("not a url");

    // Then
    assert_that!(session.last_path(), eq("/a"));
}

#[test]
fn given_unparsable_server_url_when_update_for_then_invalid_server_url() {
    // Given
    let session = BrowserSession::new();

    // When
    let result = session.update_for(&data("::nope::", "k3y"));

    // Then
    assert!(matches!(result, Err(ControlError::InvalidServerUrl { .. })));
}

#[test]
fn given_url_without_authority_when_update_for_then_invalid_server_url() {
    // Given
    let session = BrowserSession::new();

    // When
    let result = session.update_for(&data("mailto:someone@example.com", "k3y"));

    // Then
    assert!(matches!(result, Err(ControlError::InvalidServerUrl { .. })));
}

#[test]
fn given_empty_app_key_when_update_for_then_empty_app_key() {
    // Given
    let session = BrowserSession::new();

    // When
    let result = session.update_for(&data("http://127.0.0.1:8123", ""));

    // Then
    assert!(matches!(result, Err(ControlError::EmptyAppKey { .. })));
}
