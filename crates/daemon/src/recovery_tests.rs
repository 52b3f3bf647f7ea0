// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

use std::sync::Arc;

use super::*;
use crank_core::FakeClock;
use crank_storage::{FailOp, FailStore, MemStore, Store};

fn meta_for(agent_id: i64) -> Metadata {
    let mut meta = Metadata::new();
    meta.set_agent_id(agent_id);
    meta
}

fn coordinator_with_agent(agent_id: i64) -> (RecoveryCoordinator<FakeClock>, Arc<MemStore>, FakeClock) {
    let store = Arc::new(MemStore::new());
    store.seed_agent(agent_id, 100);
    let clock = FakeClock::new();
    let coordinator = RecoveryCoordinator::new(store.clone(), clock.clone(), true);
    (coordinator, store, clock)
}

fn steps(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn disabled_rejects_init_before_identity_resolution() {
    let store = Arc::new(MemStore::new());
    let coordinator = RecoveryCoordinator::new(store, FakeClock::new(), false);

    // No identity in metadata at all: Disabled still wins
    let err = coordinator
        .init_workflow_recovery(&Metadata::new(), "wf-1", &steps(&["s1"]), 300)
        .await
        .unwrap_err();
    assert!(matches!(err, RecoveryError::Disabled));
}

#[tokio::test]
async fn disabled_rejects_update() {
    let store = Arc::new(MemStore::new());
    let coordinator = RecoveryCoordinator::new(store, FakeClock::new(), false);

    let err = coordinator
        .update_step_recovery_state("wf-1", "s1", RecoveryStatus::Running, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, RecoveryError::Disabled));
}

#[tokio::test]
async fn init_creates_pending_records_tagged_to_caller() {
    let (coordinator, store, _) = coordinator_with_agent(42);

    let map = coordinator
        .init_workflow_recovery(&meta_for(42), "wf-1", &steps(&["s1", "s2"]), 300)
        .await
        .unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(map["s1"], RecoveryStatus::Pending);
    assert_eq!(map["s2"], RecoveryStatus::Pending);

    for record in store.recovery_get_all("wf-1").await.unwrap() {
        assert_eq!(record.agent_id, 42);
        assert_eq!(record.expiry, 300);
    }
}

#[tokio::test]
async fn init_read_back_reflects_prior_progress_unmodified() {
    let (coordinator, store, _) = coordinator_with_agent(42);

    // A crashed earlier attempt finished s2
    store
        .recovery_update(
            RecoveryRecord::new("wf-1", "s2")
                .with_status(RecoveryStatus::Success)
                .finished_at(9_000),
        )
        .await
        .unwrap();

    let map = coordinator
        .init_workflow_recovery(&meta_for(42), "wf-1", &steps(&["s1", "s2"]), 300)
        .await
        .unwrap();

    let expected: HashMap<String, RecoveryStatus> = [
        ("s1".to_string(), RecoveryStatus::Pending),
        ("s2".to_string(), RecoveryStatus::Success),
    ]
    .into();
    assert_eq!(map, expected);
}

#[tokio::test]
async fn init_without_identity_fails() {
    let (coordinator, _, _) = coordinator_with_agent(42);

    let err = coordinator
        .init_workflow_recovery(&Metadata::new(), "wf-1", &steps(&["s1"]), 300)
        .await
        .unwrap_err();
    assert!(matches!(err, RecoveryError::IdentityMissing));
}

#[tokio::test]
async fn init_unknown_agent_propagates_lookup_error() {
    let store = Arc::new(MemStore::new());
    let coordinator = RecoveryCoordinator::new(store, FakeClock::new(), true);

    let err = coordinator
        .init_workflow_recovery(&meta_for(7), "wf-1", &steps(&["s1"]), 300)
        .await
        .unwrap_err();
    assert!(matches!(err, RecoveryError::Storage(StorageError::AgentNotFound(7))));
}

#[tokio::test]
async fn update_running_sets_started_only() {
    let (coordinator, store, clock) = coordinator_with_agent(42);
    clock.set_epoch_ms(1_700_000_000_000);

    coordinator
        .update_step_recovery_state("wf-1", "s1", RecoveryStatus::Running, 0)
        .await
        .unwrap();

    let records = store.recovery_get_all("wf-1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status().unwrap(), RecoveryStatus::Running);
    assert_eq!(records[0].started_at, 1_700_000_000);
    assert_eq!(records[0].finished_at, 0);
}

#[tokio::test]
async fn update_success_sets_finished_with_default_exit_code() {
    let (coordinator, store, clock) = coordinator_with_agent(42);
    clock.set_epoch_ms(1_700_000_000_000);

    coordinator
        .update_step_recovery_state("wf-1", "s1", RecoveryStatus::Success, 0)
        .await
        .unwrap();

    let records = store.recovery_get_all("wf-1").await.unwrap();
    assert_eq!(records[0].status().unwrap(), RecoveryStatus::Success);
    assert_eq!(records[0].finished_at, 1_700_000_000);
    assert_eq!(records[0].started_at, 0);
    assert_eq!(records[0].exit_code, 0);
}

#[tokio::test]
async fn update_failed_overwrites_prior_running_record() {
    let (coordinator, store, clock) = coordinator_with_agent(42);

    clock.set_epoch_ms(1_000_000);
    coordinator
        .update_step_recovery_state("wf-1", "s1", RecoveryStatus::Running, 0)
        .await
        .unwrap();

    clock.set_epoch_ms(2_000_000);
    coordinator
        .update_step_recovery_state("wf-1", "s1", RecoveryStatus::Failed, 137)
        .await
        .unwrap();

    // Last transition wins: the replacement does not merge with the
    // prior Running record, so started_at is gone.
    let records = store.recovery_get_all("wf-1").await.unwrap();
    assert_eq!(records[0].status().unwrap(), RecoveryStatus::Failed);
    assert_eq!(records[0].exit_code, 137);
    assert_eq!(records[0].finished_at, 2_000);
    assert_eq!(records[0].started_at, 0);
}

#[tokio::test]
async fn update_skipped_sets_no_timestamps() {
    let (coordinator, store, _) = coordinator_with_agent(42);

    coordinator
        .update_step_recovery_state("wf-1", "s1", RecoveryStatus::Skipped, 0)
        .await
        .unwrap();

    let records = store.recovery_get_all("wf-1").await.unwrap();
    assert_eq!(records[0].status().unwrap(), RecoveryStatus::Skipped);
    assert_eq!(records[0].started_at, 0);
    assert_eq!(records[0].finished_at, 0);
}

#[tokio::test]
async fn create_error_propagates_unchanged() {
    let backend = StorageError::Backend("create blew up".into());
    let store = Arc::new(FailStore::new(FailOp::RecoveryCreate, backend.clone()));
    store.store().seed_agent(42, 100);
    let coordinator = RecoveryCoordinator::new(store, FakeClock::new(), true);

    let err = coordinator
        .init_workflow_recovery(&meta_for(42), "wf-1", &steps(&["s1"]), 300)
        .await
        .unwrap_err();
    match err {
        RecoveryError::Storage(e) => assert_eq!(e, backend),
        other => panic!("expected storage error, got {other:?}"),
    }
}

#[tokio::test]
async fn read_back_error_propagates_unchanged() {
    let backend = StorageError::Backend("read blew up".into());
    let store = Arc::new(FailStore::new(FailOp::RecoveryGetAll, backend.clone()));
    store.store().seed_agent(42, 100);
    let coordinator = RecoveryCoordinator::new(store, FakeClock::new(), true);

    let err = coordinator
        .init_workflow_recovery(&meta_for(42), "wf-1", &steps(&["s1"]), 300)
        .await
        .unwrap_err();
    match err {
        RecoveryError::Storage(e) => assert_eq!(e, backend),
        other => panic!("expected storage error, got {other:?}"),
    }
}

#[tokio::test]
async fn update_error_propagates_unchanged() {
    let backend = StorageError::Backend("update blew up".into());
    let store = Arc::new(FailStore::new(FailOp::RecoveryUpdate, backend.clone()));
    let coordinator = RecoveryCoordinator::new(store, FakeClock::new(), true);

    let err = coordinator
        .update_step_recovery_state("wf-1", "s1", RecoveryStatus::Running, 0)
        .await
        .unwrap_err();
    match err {
        RecoveryError::Storage(e) => assert_eq!(e, backend),
        other => panic!("expected storage error, got {other:?}"),
    }
}
