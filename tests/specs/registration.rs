// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Crank Contributors

//! Agent registration specs.

use crate::prelude::*;
use crank_wire::{Envelope, ErrorCode, Metadata, Request, Response};

#[tokio::test]
async fn register_assigns_distinct_identities() {
    let daemon = TestDaemon::start().await;

    let (_, first) = daemon.register().await;
    let (_, second) = daemon.register().await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn register_with_known_hint_keeps_identity() {
    let daemon = TestDaemon::start().await;
    let (_, agent_id) = daemon.register().await;

    // Re-registration after token loss names the existing identity
    let request = Request::Register { secret: SECRET.to_string(), agent_id };
    match daemon.call(&Envelope::new(request)).await {
        Response::Registered { agent_id: got, token } => {
            assert_eq!(got, agent_id);
            assert!(!token.is_empty());
        }
        other => panic!("expected Registered, got {:?}", other),
    }
}

#[tokio::test]
async fn register_with_unknown_hint_is_rejected() {
    let daemon = TestDaemon::start().await;

    let request = Request::Register { secret: SECRET.to_string(), agent_id: 999 };
    match daemon.call(&Envelope::new(request)).await {
        Response::Error { code, .. } => assert_eq!(code, ErrorCode::Unauthenticated),
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn register_with_wrong_secret_is_rejected() {
    let daemon = TestDaemon::start().await;

    let request = Request::Register { secret: "not-the-secret".to_string(), agent_id: -1 };
    match daemon.call(&Envelope::new(request)).await {
        Response::Error { code, message } => {
            assert_eq!(code, ErrorCode::Unauthenticated);
            assert_eq!(message, "invalid agent secret");
        }
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn issued_token_passes_the_gate() {
    let daemon = TestDaemon::start().await;
    let (meta, _) = daemon.register().await;

    let response = daemon.call(&Envelope::with_meta(Request::Ping, meta)).await;
    assert_eq!(response, Response::Pong);
}

#[tokio::test]
async fn forged_token_is_rejected_across_daemons() {
    // A token signed by one daemon's secret is garbage to a daemon
    // holding a different secret. Verified here with a token signed by
    // an unrelated authority.
    let daemon = TestDaemon::start().await;
    let forged = crank_auth::TokenAuthority::new(
        "some-other-secret",
        std::time::Duration::from_secs(3600),
    )
    .issue(1)
    .unwrap();

    let meta = Metadata::new().with_token(forged);
    match daemon.call(&Envelope::with_meta(Request::Ping, meta)).await {
        Response::Error { code, message } => {
            assert_eq!(code, ErrorCode::Unauthenticated);
            assert_eq!(message, "access token is invalid");
        }
        other => panic!("expected error, got {:?}", other),
    }
}
