// # dnsgen-core
//
// Core library for dnsgen: render a template and/or run a command whenever
// the DNS resolution of a set of hostnames changes.
//
// ## Architecture Overview
//
// - **Resolver**: Trait for forward hostname lookup (sorted address lists)
// - **detector**: Order-independent address-set comparison
// - **HostMonitor**: One polling task per hostname
// - **ReactionEngine**: Serialized render → write → command routine
// - **OutputWriter**: Atomic, content-diffed output file replacement
// - **TemplateWatcher**: Re-renders on template edits
// - **SignalRouter**: SIGHUP reload, SIGINT/SIGTERM shutdown
// - **Supervisor**: Starts every task and waits for all of them
//
// ## Design Principles
//
// 1. **Explicit Context**: Tasks share one `Arc<ReactionEngine>` and one
//    cancellation token; there is no global state
// 2. **Serialized Side Effects**: At most one reaction runs at a time
// 3. **Local Failure Handling**: Per-poll and per-reaction errors are logged,
//    never propagated; only startup validation is fatal
// 4. **Library-First**: The daemon binary is a thin wrapper

pub mod command;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod output;
pub mod resolver;
pub mod signals;
pub mod supervisor;
pub mod template;
pub mod traits;
pub mod watcher;

// Re-export core types for convenience
pub use config::{DnsGenConfig, parse_duration};
pub use detector::equivalent;
pub use engine::{EngineEvent, ReactionEngine, ReactionReport, Trigger};
pub use error::{Error, Result};
pub use monitor::{HostMonitor, HostTarget, PollOutcome};
pub use output::{OutputWriter, WriteOutcome};
pub use resolver::SystemResolver;
pub use supervisor::Supervisor;
pub use traits::Resolver;
