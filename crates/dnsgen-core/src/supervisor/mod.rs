//! Lifecycle coordination
//!
//! The Supervisor validates the configuration, builds the shared context and
//! fans out one task per concern:
//!
//! - one [`HostMonitor`] per hostname
//! - one [`TemplateWatcher`] (only when a template is configured)
//! - one [`SignalRouter`] (only in [`Supervisor::run`])
//!
//! It then waits for every task to exit. Shutdown is cooperative: tasks
//! observe the cancelled token at their next select point, and an in-flight
//! reaction always runs to completion first.
//!
//! ## Lifecycle
//!
//! 1. Create with [`Supervisor::new()`] (fatal startup errors surface here)
//! 2. Start with [`Supervisor::run()`]
//! 3. Runs until SIGINT/SIGTERM
//! 4. Returns once every task has joined

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::DnsGenConfig;
use crate::engine::{EngineEvent, ReactionEngine};
use crate::error::Result;
use crate::monitor::HostMonitor;
use crate::signals::{SignalRouter, Signals};
use crate::traits::Resolver;
use crate::watcher::TemplateWatcher;

/// Starts and joins every dnsgen task
pub struct Supervisor {
    /// Validated configuration
    config: DnsGenConfig,

    /// Resolver shared by monitors and templates
    resolver: Arc<dyn Resolver>,

    /// Shared reaction engine
    engine: Arc<ReactionEngine>,

    /// Template subscription, established at construction when possible
    watcher: Option<TemplateWatcher>,
}

impl Supervisor {
    /// Create a new supervisor
    ///
    /// Validates the configuration, so every fatal condition is reported
    /// before any monitoring starts, then subscribes to template changes.
    ///
    /// # Returns
    ///
    /// A tuple of (supervisor, event_receiver) where event_receiver yields engine events
    pub fn new(
        config: DnsGenConfig,
        resolver: Arc<dyn Resolver>,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (engine, rx) = ReactionEngine::new(&config, Arc::clone(&resolver))
            .with_events(config.event_channel_capacity);

        // Subscription failures are not fatal; host changes still re-render
        let watcher = config
            .template_path()
            .and_then(|path| match TemplateWatcher::new(path) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    error!("{}", e);
                    None
                }
            });

        let supervisor = Self {
            config,
            resolver,
            engine: Arc::new(engine),
            watcher,
        };

        Ok((supervisor, rx))
    }

    /// Run until SIGINT or SIGTERM
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown, every task joined
    /// - `Err(Error)`: Signal handlers could not be installed
    pub async fn run(self) -> Result<()> {
        let signals = Signals::subscribe()?;
        self.run_internal(CancellationToken::new(), Some(signals))
            .await
    }

    /// Run until the given token is cancelled
    ///
    /// No OS signal handlers are installed; the caller owns shutdown. Used
    /// when embedding the library and in tests.
    pub async fn run_with_shutdown(self, shutdown: CancellationToken) -> Result<()> {
        self.run_internal(shutdown, None).await
    }

    async fn run_internal(
        self,
        shutdown: CancellationToken,
        signals: Option<Signals>,
    ) -> Result<()> {
        info!(
            "Monitoring {} hosts every {:?}: {:?}",
            self.config.hostnames.len(),
            self.config.interval,
            self.config.hostnames
        );

        let mut tasks = JoinSet::new();

        for hostname in &self.config.hostnames {
            let monitor = HostMonitor::new(
                hostname.clone(),
                Arc::clone(&self.resolver),
                Arc::clone(&self.engine),
                self.config.interval,
            )?;
            let shutdown = shutdown.clone();
            tasks.spawn(async move {
                monitor.run(shutdown).await;
            });
        }

        if let Some(watcher) = self.watcher {
            debug!("watching template {}", watcher.path().display());
            tasks.spawn(watcher.run(Arc::clone(&self.engine), shutdown.clone()));
        }

        if let Some(signals) = signals {
            let router = SignalRouter::new(Arc::clone(&self.engine), shutdown.clone());
            tasks.spawn(router.run(signals));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("task exited abnormally: {}", e);
            }
        }

        info!("All tasks stopped");
        self.engine.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }
}
