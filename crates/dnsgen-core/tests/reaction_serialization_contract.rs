//! Behavioral Contract Test: Reaction Serialization
//!
//! This test verifies that reactions are mutually exclusive system-wide.
//!
//! Constraints verified:
//! - Concurrent triggers never overlap inside the reaction body
//! - N triggers produce exactly N reactions (no coalescing, no drops)
//! - Entry timestamps are monotonically non-decreasing
//! - Different trigger sources share the same lock
//!
//! If this test fails, someone has:
//! - Removed or bypassed the reaction lock
//! - Added debouncing that drops triggers

mod common;

use common::*;
use dnsgen_core::{DnsGenConfig, EngineEvent, HostMonitor, Resolver, Trigger};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_triggers_run_sequentially() {
    const N: usize = 6;

    let dir = tempdir().unwrap();
    let log = dir.path().join("log");

    // The command detects overlap: a second entry while the lock file exists
    let command = format!(
        "if [ -e {lock} ]; then echo overlap >> {log}; fi; touch {lock}; sleep 0.05; rm {lock}; echo done >> {log}",
        lock = dir.path().join("lock").display(),
        log = log.display(),
    );

    let resolver: Arc<dyn Resolver> = Arc::new(ScriptedResolver::new());
    let config = DnsGenConfig::new(["svc.internal"]).with_command(command);
    let (engine, mut event_rx) = engine_with_events(&config, resolver);

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let trigger = if i % 2 == 0 {
                    Trigger::TemplateChanged
                } else {
                    Trigger::HostChanged {
                        hostname: "svc.internal".to_string(),
                    }
                };
                engine.react(trigger).await
            })
        })
        .collect();

    let mut reports = Vec::new();
    for handle in handles {
        reports.push(handle.await.unwrap());
    }

    let log = fs::read_to_string(&log).unwrap();
    assert!(!log.contains("overlap"), "reactions overlapped:\n{log}");
    assert_eq!(log.lines().count(), N);

    // Started/Finished strictly alternate with increasing sequence numbers
    let events = drain(&mut event_rx);
    assert_eq!(events.len(), 2 * N);
    let mut last_started_at = None;
    for (i, pair) in events.chunks(2).enumerate() {
        let expected = (i + 1) as u64;
        match (&pair[0], &pair[1]) {
            (
                EngineEvent::ReactionStarted {
                    sequence,
                    started_at,
                    ..
                },
                EngineEvent::ReactionFinished { report },
            ) => {
                assert_eq!(*sequence, expected);
                assert_eq!(report.sequence, expected);
                if let Some(previous) = last_started_at {
                    assert!(*started_at >= previous, "entry times must not go backwards");
                }
                last_started_at = Some(*started_at);
            }
            other => panic!("events interleaved: {other:?}"),
        }
    }

    // No reaction started before the previous one finished
    reports.sort_by_key(|r| r.sequence);
    for window in reports.windows(2) {
        assert!(window[1].started_at >= window[0].finished_at);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dns_change_and_reload_at_same_instant_both_react() {
    let resolver = Arc::new(ScriptedResolver::new());
    resolver.script("svc.internal", [answer(&["10.0.0.1"])]);
    let resolver: Arc<dyn Resolver> = resolver;

    let config = DnsGenConfig::new(["svc.internal"]).with_command("sleep 0.05");
    let (engine, mut event_rx) = engine_with_events(&config, Arc::clone(&resolver));
    let mut monitor = HostMonitor::new(
        "svc.internal",
        resolver,
        Arc::clone(&engine),
        Duration::from_secs(5),
    )
    .unwrap();

    let reload = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.react(Trigger::Reload).await })
    };
    let poll = tokio::spawn(async move { monitor.poll().await });

    reload.await.unwrap();
    poll.await.unwrap();

    let events = drain(&mut event_rx);
    assert_eq!(reactions_started(&events), 2);

    let sequences: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::ReactionFinished { report } => Some(report.sequence),
            _ => None,
        })
        .collect();
    assert_eq!(sequences, vec![1, 2]);
}
