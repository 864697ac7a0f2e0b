//! Behavioral Contract Test: Idle Behavior
//!
//! This test verifies that a running daemon does NO reaction work while the
//! DNS answers stay the same.
//!
//! Constraints verified:
//! - Only the initial resolution reacts
//! - Repeated identical answers never react
//! - The first poll happens immediately, not after one interval
//!
//! If this test fails, someone has added:
//! - Periodic reactions independent of changes
//! - A delayed first poll

mod common;

use common::*;
use dnsgen_core::{DnsGenConfig, Supervisor};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn steady_answers_react_once() {
    let resolver = Arc::new(ScriptedResolver::new());
    resolver.script("svc.internal", [answer(&["10.0.0.1", "10.0.0.2"])]);
    let scripted = Arc::clone(&resolver);

    let config =
        DnsGenConfig::new(["svc.internal"]).with_interval(Duration::from_millis(10));
    let (supervisor, mut event_rx) =
        Supervisor::new(config, resolver).expect("supervisor construction succeeds");

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(supervisor.run_with_shutdown(shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.cancel();
    handle.await.unwrap().unwrap();

    assert!(
        scripted.call_count() > 3,
        "monitor should have polled repeatedly, got {}",
        scripted.call_count()
    );
    assert_eq!(
        reactions_started(&drain(&mut event_rx)),
        1,
        "only the initial resolution may react"
    );
}

#[tokio::test]
async fn first_poll_is_immediate() {
    let resolver = Arc::new(ScriptedResolver::new());
    resolver.script("svc.internal", [answer(&["10.0.0.1"])]);
    let scripted = Arc::clone(&resolver);

    // An interval far longer than the test
    let config = DnsGenConfig::new(["svc.internal"]).with_interval(Duration::from_secs(3600));
    let (supervisor, mut event_rx) =
        Supervisor::new(config, resolver).expect("supervisor construction succeeds");

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(supervisor.run_with_shutdown(shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(scripted.call_count(), 1);
    assert_eq!(reactions_started(&drain(&mut event_rx)), 1);
}
