//! Signal routing
//!
//! The [`SignalRouter`] is the only subscriber to OS signals. It turns them
//! into actions on the shared context:
//!
//! | Signal            | Action                                   |
//! |-------------------|------------------------------------------|
//! | SIGHUP            | manual reload (one reaction)             |
//! | SIGINT / SIGTERM  | cancel the shutdown token                |
//! | SIGQUIT           | logged only                              |
//!
//! Every other task selects on the shutdown token, so a single delivery
//! reaches all of them.

use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::{ReactionEngine, Trigger};
use crate::error::{Error, Result};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Signals the daemon subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Hangup,
    Interrupt,
    Quit,
    Terminate,
}

impl Signal {
    /// Conventional signal name
    pub fn name(self) -> &'static str {
        match self {
            Signal::Hangup => "SIGHUP",
            Signal::Interrupt => "SIGINT",
            Signal::Quit => "SIGQUIT",
            Signal::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the router does after handling a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep listening
    Continue,
    /// Shutdown was initiated; the router exits
    Shutdown,
}

/// Process-wide signal subscription
#[cfg(unix)]
pub struct Signals {
    hangup: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    /// Install handlers for SIGHUP, SIGINT, SIGQUIT and SIGTERM
    pub fn subscribe() -> Result<Self> {
        let install = |kind: SignalKind, name: &str| {
            signal(kind).map_err(|e| Error::signal(format!("Failed to setup {} handler: {}", name, e)))
        };

        Ok(Self {
            hangup: install(SignalKind::hangup(), "SIGHUP")?,
            interrupt: install(SignalKind::interrupt(), "SIGINT")?,
            quit: install(SignalKind::quit(), "SIGQUIT")?,
            terminate: install(SignalKind::terminate(), "SIGTERM")?,
        })
    }

    /// Wait for the next delivered signal
    pub async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            Some(()) = self.hangup.recv() => Some(Signal::Hangup),
            Some(()) = self.interrupt.recv() => Some(Signal::Interrupt),
            Some(()) = self.quit.recv() => Some(Signal::Quit),
            Some(()) = self.terminate.recv() => Some(Signal::Terminate),
            else => None,
        }
    }
}

/// Process-wide signal subscription
///
/// Fallback for non-Unix platforms: only Ctrl-C is available.
#[cfg(not(unix))]
pub struct Signals;

#[cfg(not(unix))]
impl Signals {
    /// Install the Ctrl-C handler
    pub fn subscribe() -> Result<Self> {
        Ok(Self)
    }

    /// Wait for the next Ctrl-C
    pub async fn recv(&mut self) -> Option<Signal> {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some(Signal::Interrupt),
            Err(e) => {
                tracing::error!("Failed to wait for CTRL-C: {}", e);
                None
            }
        }
    }
}

/// Routes delivered signals to reload or shutdown
pub struct SignalRouter {
    engine: Arc<ReactionEngine>,
    shutdown: CancellationToken,
}

impl SignalRouter {
    /// Create a router acting on the shared engine and shutdown token
    pub fn new(engine: Arc<ReactionEngine>, shutdown: CancellationToken) -> Self {
        Self { engine, shutdown }
    }

    /// Handle one signal
    pub async fn route(&self, signal: Signal) -> Disposition {
        match signal {
            Signal::Interrupt | Signal::Terminate => {
                info!("Received shutdown signal: {}", signal);
                self.shutdown.cancel();
                Disposition::Shutdown
            }
            Signal::Hangup => {
                info!("[CHANGE] caught {}", signal);
                self.engine.react(Trigger::Reload).await;
                Disposition::Continue
            }
            Signal::Quit => {
                info!("signal caught: {}", signal);
                Disposition::Continue
            }
        }
    }

    /// Route signals until shutdown
    ///
    /// Also exits when the shutdown token is cancelled by someone else.
    pub async fn run(self, mut signals: Signals) {
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break,

                signal = signals.recv() => match signal {
                    Some(signal) => {
                        if self.route(signal).await == Disposition::Shutdown {
                            break;
                        }
                    }
                    None => {
                        debug!("signal streams closed");
                        break;
                    }
                },
            }
        }
        debug!("signal router stopping");
    }
}
