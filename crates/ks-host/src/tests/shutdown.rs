use crate::shutdown::ShutdownCoordinator;

use std::time::Duration;

// =========================================================================
// ShutdownCoordinator
// =========================================================================

#[tokio::test]
async fn given_guard_when_shutdown_then_wait_returns() {
    // Given
    let coordinator = ShutdownCoordinator::new();
    let mut guard = coordinator.subscribe_guard();

    // When
    coordinator.shutdown();

    // Then
    let waited = tokio::time::timeout(Duration::from_secs(1), guard.wait()).await;
    assert!(waited.is_ok());
    assert!(coordinator.is_shutdown());
}

#[tokio::test]
async fn given_already_triggered_when_new_guard_waits_then_returns_immediately() {
    // Given
    let coordinator = ShutdownCoordinator::new();
    coordinator.shutdown();

    // When
    let mut guard = coordinator.subscribe_guard();
    let waited = tokio::time::timeout(Duration::from_millis(100), guard.wait()).await;

    // Then
    assert!(waited.is_ok());
}

#[test]
fn given_triggered_coordinator_when_shutdown_again_then_idempotent() {
    // Given
    let coordinator = ShutdownCoordinator::new();
    coordinator.shutdown();

    // When
    coordinator.shutdown();

    // Then
    assert!(coordinator.is_shutdown());
}

#[test]
fn given_guard_when_polled_before_and_after_shutdown_then_reports_state() {
    // Given
    let coordinator = ShutdownCoordinator::new();
    let mut guard = coordinator.subscribe_guard();

    // When
    let before = guard.poll_shutdown();
    coordinator.shutdown();
    let after = guard.poll_shutdown();

    // Then
    assert!(!before);
    assert!(after);
}
