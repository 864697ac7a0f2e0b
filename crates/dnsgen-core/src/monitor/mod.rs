//! Per-hostname DNS monitor
//!
//! Each watched hostname gets its own [`HostMonitor`] task:
//!
//! ```text
//! Idle ──tick──▶ Polling ──▶ Unchanged ──▶ Idle
//!                   │
//!                   └──────▶ Changed ──react──▶ Idle
//!
//! (any state) ──shutdown──▶ Stopped
//! ```
//!
//! The first poll happens immediately, then every `interval`. The last-known
//! address set is owned by the monitor and never shared; a failed lookup of
//! either kind leaves it untouched.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::detector::equivalent;
use crate::engine::{ReactionEngine, Trigger};
use crate::error::{Error, ResolveError, Result};
use crate::traits::Resolver;

/// A monitored hostname and its last-known resolved address set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    /// The hostname being watched
    pub hostname: String,
    /// Last successfully resolved addresses, sorted
    pub addresses: Vec<String>,
}

impl HostTarget {
    /// A target with no known addresses yet
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            addresses: Vec::new(),
        }
    }
}

/// Result of a single poll
#[derive(Debug)]
pub enum PollOutcome {
    /// Same address set as before; nothing happened
    Unchanged,
    /// Address set changed and a reaction ran
    Changed {
        previous: Vec<String>,
        current: Vec<String>,
    },
    /// Transient resolver failure; retried on the next tick
    Retry(ResolveError),
    /// Permanent resolver failure; known addresses kept
    Failed(ResolveError),
}

/// Polls one hostname and reacts when its address set changes
pub struct HostMonitor {
    target: HostTarget,
    resolver: Arc<dyn Resolver>,
    engine: Arc<ReactionEngine>,
    interval: Duration,
}

impl HostMonitor {
    /// Create a monitor for a hostname
    ///
    /// # Parameters
    ///
    /// - `hostname`: Hostname to watch
    /// - `resolver`: Shared resolver
    /// - `engine`: Shared reaction engine
    /// - `interval`: Time between polls; must be non-zero
    pub fn new(
        hostname: impl Into<String>,
        resolver: Arc<dyn Resolver>,
        engine: Arc<ReactionEngine>,
        interval: Duration,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::config("Interval must be greater than zero"));
        }

        Ok(Self {
            target: HostTarget::new(hostname),
            resolver,
            engine,
            interval,
        })
    }

    /// The hostname and its last-known addresses
    pub fn target(&self) -> &HostTarget {
        &self.target
    }

    /// Resolve once, compare, and react on change
    pub async fn poll(&mut self) -> PollOutcome {
        let hostname = self.target.hostname.as_str();
        let start = Instant::now();

        let addresses = match self.resolver.resolve(hostname).await {
            Ok(addresses) => addresses,
            Err(e) if e.is_temporary() => {
                warn!("temporary error resolving hostname: {}. will retry...", e);
                return PollOutcome::Retry(e);
            }
            Err(e) => {
                error!("error resolving hostname: {}", e);
                return PollOutcome::Failed(e);
            }
        };

        debug!(
            "lookup [{}] => {:?} in {:?}",
            hostname,
            addresses,
            start.elapsed()
        );

        if equivalent(&self.target.addresses, &addresses) {
            return PollOutcome::Unchanged;
        }

        self.engine
            .host_changed(hostname, &self.target.addresses, &addresses);
        self.engine
            .react(Trigger::HostChanged {
                hostname: hostname.to_string(),
            })
            .await;

        let previous = std::mem::replace(&mut self.target.addresses, addresses);
        PollOutcome::Changed {
            previous,
            current: self.target.addresses.clone(),
        }
    }

    /// Poll until shutdown
    ///
    /// Shutdown is observed between polls; a poll (and its reaction) in
    /// progress always completes.
    ///
    /// # Returns
    ///
    /// The final state of the target.
    pub async fn run(mut self, shutdown: CancellationToken) -> HostTarget {
        info!(
            "Monitoring {} every {:?}",
            self.target.hostname, self.interval
        );

        // First tick completes immediately
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("monitor for {} stopping", self.target.hostname);
                    break;
                }

                _ = ticker.tick() => {
                    self.poll().await;
                }
            }
        }

        self.target
    }
}
