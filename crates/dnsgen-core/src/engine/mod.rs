//! Reaction engine
//!
//! The ReactionEngine is responsible for:
//! - Rendering the template (if configured) and writing it atomically
//! - Executing the configured command (if any)
//! - Serializing both across every trigger source
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  ┌──────────────────┐  ┌───────────────┐
//! │ HostMonitor │  │ TemplateWatcher  │  │ SignalRouter  │
//! │  (change)   │  │ (write / create) │  │   (SIGHUP)    │
//! └─────────────┘  └──────────────────┘  └───────────────┘
//!        │                  │                    │
//!        └──────────────────┼────────────────────┘
//!                           ▼
//!                  ┌─────────────────┐
//!                  │ ReactionEngine  │ (one reaction at a time)
//!                  └─────────────────┘
//!                           │
//!            ┌──────────────┴──────────────┐
//!            ▼                             ▼
//!   ┌─────────────────┐          ┌──────────────────┐
//!   │ render + write  │ ───────▶ │  shell command   │
//!   └─────────────────┘          └──────────────────┘
//! ```
//!
//! ## Reaction Flow
//!
//! 1. Acquire the reaction lock (waits behind any reaction in flight)
//! 2. If a template is configured, render it; on success hand the bytes to
//!    the [`OutputWriter`]
//! 3. If a command is configured, run it, whatever happened in step 2
//! 4. Emit events for monitoring/logging
//!
//! Triggers are queued, never coalesced: N triggers give N reactions.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use crate::command::ShellCommand;
use crate::config::DnsGenConfig;
use crate::output::{OutputWriter, WriteOutcome};
use crate::template::TemplateRenderer;
use crate::traits::Resolver;

/// Why a reaction ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A host's resolved address set changed
    HostChanged { hostname: String },

    /// The template file was written or created
    TemplateChanged,

    /// Manual reload (SIGHUP)
    Reload,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::HostChanged { hostname } => write!(f, "host change ({})", hostname),
            Trigger::TemplateChanged => f.write_str("template change"),
            Trigger::Reload => f.write_str("reload"),
        }
    }
}

/// Outcome of the render + write stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    /// No template configured
    NotConfigured,
    /// Rendered and handed to the output writer
    Written(WriteOutcome),
    /// Rendering failed; nothing was written
    RenderFailed(String),
    /// Rendered, but the output writer failed
    WriteFailed(String),
}

/// Outcome of the command stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// No command configured
    NotConfigured,
    /// Command exited successfully
    Succeeded { elapsed: Duration },
    /// Command could not be launched or exited non-zero
    Failed(String),
}

/// Summary of one completed reaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionReport {
    /// Position in the global execution order (starts at 1)
    pub sequence: u64,
    /// What caused the reaction
    pub trigger: Trigger,
    /// When the reaction body was entered (lock held)
    pub started_at: DateTime<Utc>,
    /// When the reaction body finished
    pub finished_at: DateTime<Utc>,
    /// Render + write stage outcome
    pub render: RenderStatus,
    /// Command stage outcome
    pub command: CommandStatus,
}

/// Events emitted by the ReactionEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A monitored host changed its address set
    HostChanged {
        hostname: String,
        previous: Vec<String>,
        current: Vec<String>,
    },

    /// A reaction acquired the lock and started
    ReactionStarted {
        sequence: u64,
        trigger: Trigger,
        started_at: DateTime<Utc>,
    },

    /// A reaction finished
    ReactionFinished { report: ReactionReport },

    /// All tasks stopped
    Stopped { reason: String },
}

/// Serialized reaction routine shared by every task
///
/// One instance is built by the [`Supervisor`](crate::Supervisor) and shared
/// behind an `Arc`; it is the explicit context every task receives instead of
/// process-wide globals.
///
/// ## Threading
///
/// [`react`](Self::react) may be called concurrently from any number of
/// tasks. Calls wait on a fair (FIFO) lock, so reactions run one at a time in
/// arrival order and each runs to completion.
pub struct ReactionEngine {
    /// Template to render, if any
    template: Option<PathBuf>,

    /// Command to run, if any
    command: Option<ShellCommand>,

    /// Template renderer with the injected function set
    renderer: TemplateRenderer,

    /// Atomic output writer
    writer: OutputWriter,

    /// Reaction lock; guards the sequence counter
    lock: Mutex<u64>,

    /// Event sender for external monitoring
    event_tx: Option<mpsc::Sender<EngineEvent>>,

    /// Events lost to a full channel
    dropped_events: AtomicU64,
}

impl ReactionEngine {
    /// Create a new reaction engine
    ///
    /// # Parameters
    ///
    /// - `config`: dnsgen configuration (template, destination, command)
    /// - `resolver`: Resolver backing the `lookupHost` template function
    pub fn new(config: &DnsGenConfig, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            template: config.template.clone(),
            command: config.command.clone().map(ShellCommand::new),
            renderer: TemplateRenderer::new(resolver),
            writer: OutputWriter::new(config.destination.clone()),
            lock: Mutex::new(0),
            event_tx: None,
            dropped_events: AtomicU64::new(0),
        }
    }

    /// Attach a bounded event channel
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn with_events(mut self, capacity: usize) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.event_tx = Some(tx);
        (self, rx)
    }

    /// Replace the output writer
    pub fn with_writer(mut self, writer: OutputWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Run one reaction
    ///
    /// Never fails: every stage handles and logs its own errors so that a
    /// bad render or a failing command cannot stop the caller.
    pub async fn react(&self, trigger: Trigger) -> ReactionReport {
        let mut sequence = self.lock.lock().await;
        *sequence += 1;

        let started_at = Utc::now();
        debug!("reaction #{} started by {}", *sequence, trigger);
        self.emit_event(EngineEvent::ReactionStarted {
            sequence: *sequence,
            trigger: trigger.clone(),
            started_at,
        });

        let render = match &self.template {
            Some(path) => self.render_and_write(path).await,
            None => RenderStatus::NotConfigured,
        };

        let command = match &self.command {
            Some(command) => match command.run().await {
                Ok(output) => CommandStatus::Succeeded {
                    elapsed: output.elapsed,
                },
                Err(e) => {
                    error!("failed to execute command: {}", e);
                    CommandStatus::Failed(e.to_string())
                }
            },
            None => CommandStatus::NotConfigured,
        };

        let report = ReactionReport {
            sequence: *sequence,
            trigger,
            started_at,
            finished_at: Utc::now(),
            render,
            command,
        };

        self.emit_event(EngineEvent::ReactionFinished {
            report: report.clone(),
        });

        report
    }

    /// Render the template and hand it to the output writer
    async fn render_and_write(&self, path: &std::path::Path) -> RenderStatus {
        let start = Instant::now();

        let content = match self.renderer.render_file(path).await {
            Ok(content) => content,
            Err(e) => {
                error!("failed to execute template: {}", e);
                return RenderStatus::RenderFailed(e.to_string());
            }
        };
        debug!(
            "template [{}] generated in {:?}",
            path.display(),
            start.elapsed()
        );

        match self.writer.write(content.as_bytes()).await {
            Ok(outcome) => RenderStatus::Written(outcome),
            Err(e) => {
                error!("failed to write output file: {}", e);
                RenderStatus::WriteFailed(e.to_string())
            }
        }
    }

    /// Number of events dropped because the channel was full
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Record an address-set change for observers
    pub fn host_changed(&self, hostname: &str, previous: &[String], current: &[String]) {
        info!(
            "[CHANGE] {} [{}] -> [{}]",
            hostname,
            previous.join(" "),
            current.join(" ")
        );
        self.emit_event(EngineEvent::HostChanged {
            hostname: hostname.to_string(),
            previous: previous.to_vec(),
            current: current.to_vec(),
        });
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    pub(crate) fn emit_event(&self, event: EngineEvent) {
        let Some(tx) = &self.event_tx else {
            return;
        };

        // Dropped events only affect observers, never the reaction itself.
        // A closed channel means nobody is observing.
        if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            );
        }
    }
}
