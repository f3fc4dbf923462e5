use crate::serve::ServeSettings;

use ks_config::Config;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use googletest::assert_that;
use googletest::prelude::{eq, none, some};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

// =========================================================================
// ServeSettings
// =========================================================================

#[test]
fn given_no_env_when_resolved_then_config_defaults() {
    // When
    let settings =
        ServeSettings::from_lookup(&Config::default(), Path::new("/cfg"), lookup(&[])).unwrap();

    // Then
    assert_that!(settings.server.host, eq("127.0.0.1"));
    assert_that!(settings.server.port, eq(0));
    assert_that!(settings.app_key, none());
    assert_that!(settings.content_root, eq(&PathBuf::from("/cfg/home/content")));
}

#[test]
fn given_parent_env_when_resolved_then_env_wins() {
    // When
    let settings = ServeSettings::from_lookup(
        &Config::default(),
        Path::new("/cfg"),
        lookup(&[
            ("KS_SERVE_HOST", "localhost"),
            ("KS_SERVE_PORT", "48123"),
            ("KS_APP_KEY", "abc"),
            ("KS_HOME", "/data/home"),
        ]),
    )
    .unwrap();

    // Then
    assert_that!(settings.server.host, eq("localhost"));
    assert_that!(settings.server.port, eq(48123));
    assert_that!(settings.app_key, some(eq("abc")));
    assert_that!(settings.content_root, eq(&PathBuf::from("/data/home/content")));
}

#[test]
fn given_invalid_port_when_resolved_then_error() {
    // When
    let result = ServeSettings::from_lookup(
        &Config::default(),
        Path::new("/cfg"),
        lookup(&[("KS_SERVE_PORT", "eighty")]),
    );

    // Then
    assert!(result.is_err());
}

#[test]
fn given_non_loopback_host_when_resolved_then_error() {
    // When
    let result = ServeSettings::from_lookup(
        &Config::default(),
        Path::new("/cfg"),
        lookup(&[("KS_SERVE_HOST", "0.0.0.0")]),
    );

    // Then
    assert!(result.is_err());
}

#[test]
fn given_empty_app_key_when_resolved_then_minted_later() {
    // When
    let settings = ServeSettings::from_lookup(
        &Config::default(),
        Path::new("/cfg"),
        lookup(&[("KS_APP_KEY", "")]),
    )
    .unwrap();

    // Then
    assert_that!(settings.app_key, none());
}
