//! Tests for config entry setup and unload.

use std::time::Duration;

use mbtalive_core::prelude::*;
use mbtalive_integration::{EntryLifecycleController, LifecycleError, MbtaLiveIntegration};
use mbtalive_testing::{HostFixture, UnloadBehavior};
use serde_json::json;

fn entry(id: &str) -> ConfigEntry {
    ConfigEntry::new("mbtalive", "Park Street", json!({"stop": "place-pktrm"})).with_id(id)
}

#[tokio::test]
async fn test_setup_unload_unload_never_raises() {
    let fixture = HostFixture::new();
    let host = fixture.host();
    let controller = EntryLifecycleController::new();
    let e1 = entry("E1");

    assert!(controller.setup_entry(&host, &e1).await);
    assert!(host.is_loaded("E1"));

    assert!(controller.unload_entry(&host, &e1).await);
    assert!(!host.is_loaded("E1"));

    // Already unloaded: the mock host reports false, the hook still answers.
    assert!(!controller.unload_entry(&host, &e1).await);
    assert_eq!(controller.state("E1"), EntryState::Unconfigured);
    assert_eq!(host.unload_calls(), 2);
}

#[tokio::test]
async fn test_failed_forwarding_leaves_no_active_entry() {
    let fixture = HostFixture::new();
    let host = fixture.host().with_forward_failure("sensor platform crashed");
    let integration = MbtaLiveIntegration::new();

    assert!(integration.bootstrap(&host, &json!({})).await);
    assert!(!integration.setup_entry(&host, &entry("E1")).await);

    let controller = integration.controller();
    assert_eq!(controller.state("E1"), EntryState::Unconfigured);
    assert!(controller.active_entries().is_empty());

    let info = controller.info("E1").unwrap();
    assert!(info.last_error.unwrap().contains("sensor platform crashed"));

    let state = DomainStateStore::new(host.data(), "mbtalive")
        .get()
        .unwrap()
        .unwrap();
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_setup_recovers_after_failure() {
    let fixture = HostFixture::new();
    let host = fixture.host().with_forward_failure("not ready");
    let controller = EntryLifecycleController::new();
    let e1 = entry("E1");

    assert!(!controller.setup_entry(&host, &e1).await);

    host.set_forward_failure(None);
    assert!(controller.setup_entry(&host, &e1).await);

    let info = controller.info("E1").unwrap();
    assert_eq!(info.state, EntryState::Active);
    assert!(info.last_error.is_none());
    assert_eq!(host.forward_calls(), 2);
}

#[tokio::test]
async fn test_unload_true_iff_host_reports_success() {
    let fixture = HostFixture::new();
    let host = fixture.host();
    let controller = EntryLifecycleController::new();
    let e1 = entry("E1");
    assert!(controller.setup_entry(&host, &e1).await);

    host.set_unload_behavior(UnloadBehavior::Refuse);
    assert!(!controller.unload_entry(&host, &e1).await);
    assert_eq!(controller.state("E1"), EntryState::Active);

    host.set_unload_behavior(UnloadBehavior::Fail("platform stuck".to_string()));
    assert!(!controller.unload_entry(&host, &e1).await);
    assert_eq!(controller.state("E1"), EntryState::Active);

    host.set_unload_behavior(UnloadBehavior::Track);
    assert!(controller.unload_entry(&host, &e1).await);
    assert_eq!(controller.state("E1"), EntryState::Unconfigured);
}

#[tokio::test]
async fn test_error_kinds() {
    let fixture = HostFixture::new();
    let host = fixture
        .host()
        .with_forward_failure("boom")
        .with_unload_behavior(UnloadBehavior::Refuse);
    let controller = EntryLifecycleController::new();
    let e1 = entry("E1");

    let err = controller.try_setup_entry(&host, &e1).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Forward { .. }));
    assert!(err.to_string().contains("sensor"));

    let err = controller.try_unload_entry(&host, &e1).await.unwrap_err();
    assert!(matches!(err, LifecycleError::UnloadRejected(_)));

    host.set_unload_behavior(UnloadBehavior::Fail("gone".to_string()));
    let err = controller.try_unload_entry(&host, &e1).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Unload { .. }));
}

#[tokio::test]
async fn test_entries_are_independent() {
    let fixture = HostFixture::new();
    let host = fixture.host();
    let controller = EntryLifecycleController::new();

    assert!(controller.setup_entry(&host, &entry("E1")).await);
    assert!(controller.setup_entry(&host, &entry("E2")).await);
    assert_eq!(controller.active_entries(), vec!["E1", "E2"]);

    assert!(controller.unload_entry(&host, &entry("E1")).await);
    assert_eq!(controller.active_entries(), vec!["E2"]);
    assert!(host.is_loaded("E2"));
}

#[tokio::test]
async fn test_reconfigure_cycle() {
    let fixture = HostFixture::new();
    let host = fixture.host();
    let controller = EntryLifecycleController::new();
    let e1 = entry("E1");

    for _ in 0..3 {
        assert!(controller.setup_entry(&host, &e1).await);
        assert_eq!(controller.state("E1"), EntryState::Active);
        assert!(controller.unload_entry(&host, &e1).await);
        assert_eq!(controller.state("E1"), EntryState::Unconfigured);
    }
    assert_eq!(host.forward_calls(), 3);
    assert_eq!(host.unload_calls(), 3);
}

#[tokio::test]
async fn test_setup_cancelled_by_host_timeout_can_be_retried() {
    let fixture = HostFixture::new();
    let host = fixture.host().with_forward_delay(Duration::from_secs(3600));
    let controller = EntryLifecycleController::new();
    let e1 = entry("E1");

    let timed_out =
        tokio::time::timeout(Duration::from_millis(50), controller.setup_entry(&host, &e1)).await;
    assert!(timed_out.is_err());

    let info = controller.info("E1").unwrap();
    assert_eq!(info.state, EntryState::Unconfigured);
    assert!(info.last_error.unwrap().contains("Cancelled"));

    host.set_forward_delay(None);
    assert!(controller.setup_entry(&host, &e1).await);
    assert_eq!(controller.state("E1"), EntryState::Active);
    assert!(controller.unload_entry(&host, &e1).await);
    assert_eq!(controller.state("E1"), EntryState::Unconfigured);
}

#[tokio::test]
async fn test_unload_cancelled_by_host_timeout_keeps_entry_active() {
    let fixture = HostFixture::new();
    let host = fixture.host();
    let controller = EntryLifecycleController::new();
    let e1 = entry("E1");
    assert!(controller.setup_entry(&host, &e1).await);

    host.set_unload_delay(Some(Duration::from_secs(3600)));
    let timed_out =
        tokio::time::timeout(Duration::from_millis(50), controller.unload_entry(&host, &e1)).await;
    assert!(timed_out.is_err());
    assert_eq!(controller.state("E1"), EntryState::Active);

    host.set_unload_delay(None);
    assert!(controller.unload_entry(&host, &e1).await);
    assert!(!host.is_loaded("E1"));
}

#[tokio::test]
async fn test_finished_entries_are_not_retained() {
    let fixture = HostFixture::new();
    let host = fixture.host();
    let controller = EntryLifecycleController::new();

    for i in 0..10 {
        let e = entry(&format!("E{}", i));
        assert!(controller.setup_entry(&host, &e).await);
        assert!(controller.unload_entry(&host, &e).await);
        // Never set up on this host: the refusal leaves no record
        assert!(!controller.unload_entry(&host, &entry(&format!("ghost{}", i))).await);
    }

    for i in 0..10 {
        assert!(controller.info(&format!("E{}", i)).is_none());
        assert!(controller.info(&format!("ghost{}", i)).is_none());
    }
    assert!(controller.active_entries().is_empty());
}
