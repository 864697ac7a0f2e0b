//! Test doubles and common utilities for behavioral contract tests
//!
//! This module provides a scripted resolver and small helpers so the
//! contract tests can drive monitors and reactions deterministically.

#![allow(dead_code)]

use dnsgen_core::error::ResolveError;
use dnsgen_core::{DnsGenConfig, EngineEvent, ReactionEngine, Resolver};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// One scripted resolver response
#[derive(Debug, Clone)]
pub enum Answer {
    /// Successful lookup, returned in the given (unsorted) order
    Addresses(Vec<String>),
    /// Transient failure (EAI_AGAIN-like)
    Temporary,
    /// Hard failure (NXDOMAIN-like)
    Permanent,
}

#[derive(Default)]
struct Script {
    queue: VecDeque<Answer>,
    last: Option<Answer>,
}

/// A resolver that replays scripted answers per hostname
///
/// Once a hostname's script is exhausted its last answer repeats.
/// Unscripted hostnames fail permanently.
#[derive(Default)]
pub struct ScriptedResolver {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue answers for a hostname
    pub fn script(&self, hostname: &str, answers: impl IntoIterator<Item = Answer>) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts
            .entry(hostname.to_string())
            .or_default()
            .queue
            .extend(answers);
    }

    /// Total number of resolve() calls
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<String>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let answer = {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.entry(hostname.to_string()).or_default();
            match script.queue.pop_front() {
                Some(answer) => {
                    script.last = Some(answer.clone());
                    Some(answer)
                }
                None => script.last.clone(),
            }
        };

        match answer {
            Some(Answer::Addresses(mut addresses)) => {
                addresses.sort();
                Ok(addresses)
            }
            Some(Answer::Temporary) => Err(ResolveError::from_io(
                hostname,
                io::Error::from(io::ErrorKind::TimedOut),
            )),
            Some(Answer::Permanent) | None => Err(ResolveError::from_io(
                hostname,
                io::Error::other("Name or service not known"),
            )),
        }
    }
}

/// Shorthand for a successful answer
pub fn answer(addresses: &[&str]) -> Answer {
    Answer::Addresses(addrs(addresses))
}

/// Owned address list
pub fn addrs(addresses: &[&str]) -> Vec<String> {
    addresses.iter().map(|a| a.to_string()).collect()
}

/// Build a shared engine with an attached event channel
pub fn engine_with_events(
    config: &DnsGenConfig,
    resolver: Arc<dyn Resolver>,
) -> (Arc<ReactionEngine>, mpsc::Receiver<EngineEvent>) {
    let (engine, rx) = ReactionEngine::new(config, resolver).with_events(1000);
    (Arc::new(engine), rx)
}

/// Collect every event currently queued
pub fn drain(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Number of reactions that started among the given events
pub fn reactions_started(events: &[EngineEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, EngineEvent::ReactionStarted { .. }))
        .count()
}
