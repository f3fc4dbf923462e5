use crate::tests::{EnvGuard, setup_config_dir};
use crate::{Config, ImportConfig};

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok};
use serial_test::serial;

// =========================================================================
// Validation Tests - Import
// =========================================================================

#[test]
fn given_defaults_when_validate_then_ok() {
    assert_that!(ImportConfig::default().validate(), ok(anything()));
}

#[test]
fn given_prefix_without_trailing_slash_when_validate_then_error() {
    // Given
    let config = ImportConfig {
        content_prefix: String::from("content"),
        ..ImportConfig::default()
    };

    // Then
    assert_that!(config.validate(), err(anything()));
}

#[test]
fn given_absolute_prefix_when_validate_then_error() {
    // Given
    let config = ImportConfig {
        content_prefix: String::from("/content/"),
        manifest_path: String::from("/content/manifest.json"),
        ..ImportConfig::default()
    };

    // Then
    assert_that!(config.validate(), err(anything()));
}

#[test]
fn given_prefix_with_parent_dir_when_validate_then_error() {
    // Given
    let config = ImportConfig {
        content_prefix: String::from("../content/"),
        manifest_path: String::from("../content/manifest.json"),
        ..ImportConfig::default()
    };

    // Then
    assert_that!(config.validate(), err(anything()));
}

#[test]
fn given_manifest_outside_prefix_when_validate_then_error() {
    // Given
    let config = ImportConfig {
        manifest_path: String::from("manifest.json"),
        ..ImportConfig::default()
    };

    // Then
    assert_that!(config.validate(), err(anything()));
}

#[test]
#[serial]
fn given_buffer_too_small_when_validate_then_error() {
    // Given
    let _dir = setup_config_dir();
    let _buffer = EnvGuard::set("KS_IMPORT_BUFFER_SIZE", "64");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.import.buffer_size, eq(64));
    assert_that!(config.validate(), err(anything()));
}

#[test]
fn given_buffer_at_limits_when_validate_then_ok() {
    for size in [512, 1024 * 1024] {
        let config = ImportConfig {
            buffer_size: size,
            ..ImportConfig::default()
        };
        assert_that!(config.validate(), ok(anything()));
    }
}

#[test]
fn given_buffer_over_limit_when_validate_then_error() {
    // Given
    let config = ImportConfig {
        buffer_size: 1024 * 1024 + 1,
        ..ImportConfig::default()
    };

    // Then
    assert_that!(config.validate(), err(anything()));
}

#[test]
fn given_default_prefix_when_content_dir_name_then_slash_trimmed() {
    assert_that!(ImportConfig::default().content_dir_name(), eq("content"));
}
