// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Crash-recovery specs: init, progress reporting, and resume.

use std::collections::HashMap;

use crate::prelude::*;
use crank_core::RecoveryStatus;
use crank_wire::{read_frame, write_frame, Envelope, Metadata, Request, Response, StepEvent};

fn init_request(workflow_id: &str, step_ids: &[&str]) -> Request {
    Request::InitWorkflowRecovery {
        workflow_id: workflow_id.to_string(),
        step_ids: step_ids.iter().map(|s| s.to_string()).collect(),
        ttl_secs: 600,
    }
}

async fn init(
    daemon: &TestDaemon,
    meta: &Metadata,
    workflow_id: &str,
    step_ids: &[&str],
) -> HashMap<String, RecoveryStatus> {
    let envelope = Envelope::with_meta(init_request(workflow_id, step_ids), meta.clone());
    match daemon.call(&envelope).await {
        Response::RecoveryInit { steps } => steps,
        other => panic!("expected RecoveryInit, got {:?}", other),
    }
}

#[tokio::test]
async fn init_reports_all_steps_pending() {
    let daemon = TestDaemon::start().await;
    let (meta, _) = daemon.register().await;

    let steps = init(&daemon, &meta, "deploy-7", &["build", "test", "ship"]).await;
    assert_eq!(steps.len(), 3);
    assert!(steps.values().all(|s| *s == RecoveryStatus::Pending));
}

#[tokio::test]
async fn unary_updates_surface_in_reinit() {
    let daemon = TestDaemon::start().await;
    let (meta, _) = daemon.register().await;

    init(&daemon, &meta, "deploy-7", &["build", "test"]).await;

    for (step_id, status) in [("build", RecoveryStatus::Running), ("build", RecoveryStatus::Success)]
    {
        let update = Request::UpdateStepRecoveryState {
            workflow_id: "deploy-7".to_string(),
            step_id: step_id.to_string(),
            status,
            exit_code: 0,
        };
        let response = daemon.call(&Envelope::with_meta(update, meta.clone())).await;
        assert_eq!(response, Response::Ok);
    }

    let steps = init(&daemon, &meta, "deploy-7", &["build", "test"]).await;
    assert_eq!(steps["build"], RecoveryStatus::Success);
    assert_eq!(steps["test"], RecoveryStatus::Pending);
}

#[tokio::test]
async fn streamed_events_surface_in_reinit() {
    let daemon = TestDaemon::start().await;
    let (meta, _) = daemon.register().await;

    init(&daemon, &meta, "deploy-8", &["build", "test"]).await;

    let mut stream = daemon.connect().await;
    let open = Request::StepEventStream { workflow_id: "deploy-8".to_string() };
    write_frame(&mut stream, &Envelope::with_meta(open, meta.clone()), TIMEOUT).await.unwrap();
    let ready: Response = read_frame(&mut stream, TIMEOUT).await.unwrap();
    assert_eq!(ready, Response::StreamReady);

    let events = [
        ("build", RecoveryStatus::Running, 0),
        ("build", RecoveryStatus::Success, 0),
        ("test", RecoveryStatus::Running, 0),
        ("test", RecoveryStatus::Failed, 3),
    ];
    for (step_id, status, exit_code) in events {
        let event = StepEvent { step_id: step_id.to_string(), status, exit_code };
        write_frame(&mut stream, &event, TIMEOUT).await.unwrap();
        let ack: Response = read_frame(&mut stream, TIMEOUT).await.unwrap();
        assert_eq!(ack, Response::Ok);
    }
    drop(stream);

    let steps = init(&daemon, &meta, "deploy-8", &["build", "test"]).await;
    assert_eq!(steps["build"], RecoveryStatus::Success);
    assert_eq!(steps["test"], RecoveryStatus::Failed);
}

#[tokio::test]
async fn another_agent_resumes_after_crash() {
    // Agent one makes progress, then its daemon stops serving. A second
    // daemon over the same store hands the progress to a fresh agent.
    let daemon = TestDaemon::start().await;
    let (meta, _) = daemon.register().await;

    init(&daemon, &meta, "deploy-9", &["build", "test"]).await;
    let update = Request::UpdateStepRecoveryState {
        workflow_id: "deploy-9".to_string(),
        step_id: "build".to_string(),
        status: RecoveryStatus::Success,
        exit_code: 0,
    };
    assert_eq!(daemon.call(&Envelope::with_meta(update, meta)).await, Response::Ok);

    let store = daemon.kill();
    let daemon = TestDaemon::start_with(store, true).await;
    let (meta, _) = daemon.register().await;

    let steps = init(&daemon, &meta, "deploy-9", &["build", "test"]).await;
    assert_eq!(steps["build"], RecoveryStatus::Success);
    assert_eq!(steps["test"], RecoveryStatus::Pending);
}

#[tokio::test]
async fn recovery_disabled_daemon_rejects_init() {
    let daemon = TestDaemon::start_with(std::sync::Arc::new(crank_storage::MemStore::new()), false)
        .await;
    let (meta, _) = daemon.register().await;

    let envelope = Envelope::with_meta(init_request("deploy-10", &["build"]), meta);
    match daemon.call(&envelope).await {
        Response::Error { code, .. } => {
            assert_eq!(code, crank_wire::ErrorCode::RecoveryDisabled)
        }
        other => panic!("expected error, got {:?}", other),
    }
}
