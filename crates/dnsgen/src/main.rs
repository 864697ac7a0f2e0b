// # dnsgen - DNS change reactor
//
// This binary is a thin integration layer over dnsgen-core:
// 1. Parse flags (each also readable from a DNSGEN_* environment variable)
// 2. Validate the configuration
// 3. Initialize logging and the runtime
// 4. Hand off to the Supervisor until SIGINT/SIGTERM
//
// All monitoring, rendering and command logic lives in dnsgen-core.
//
// ## Example
//
// ```bash
// dnsgen --inter 10s --tmpl haproxy.tmpl --dest /etc/haproxy/haproxy.cfg \
//     --exec "systemctl reload haproxy" backend-a.internal backend-b.internal
// ```

use anyhow::Result;
use clap::{CommandFactory, Parser};
use dnsgen_core::{DnsGenConfig, SystemResolver, Supervisor, parse_duration};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DnsGenExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DnsGenExitCode> for ExitCode {
    fn from(code: DnsGenExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Render template or execute commands based on DNS updates
#[derive(Parser, Debug)]
#[command(name = "dnsgen", version, about)]
struct Cli {
    /// Interval between DNS queries for each hostname
    #[arg(long = "inter", env = "DNSGEN_INTERVAL", default_value = "5s", value_parser = parse_duration)]
    interval: Duration,

    /// Command to execute when a change is detected
    #[arg(long = "exec", env = "DNSGEN_EXEC")]
    command: Option<String>,

    /// Template to render when a change is detected
    #[arg(long = "tmpl", env = "DNSGEN_TEMPLATE")]
    template: Option<PathBuf>,

    /// Output file for the rendered template (stdout when unset)
    #[arg(long = "dest", env = "DNSGEN_DEST")]
    destination: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, env = "DNSGEN_DEBUG")]
    debug: bool,

    /// Hostnames to watch for updates
    #[arg(value_name = "HOSTNAME")]
    hostnames: Vec<String>,
}

impl Cli {
    fn into_config(self) -> DnsGenConfig {
        let mut config = DnsGenConfig::new(self.hostnames)
            .with_interval(self.interval)
            .with_debug(self.debug);
        config.command = self.command;
        config.template = self.template;
        config.destination = self.destination;
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Hostnames are optional to clap so that this exits 1 rather than 2
    if cli.hostnames.is_empty() {
        eprintln!("No hostnames provided");
        eprintln!("{}", Cli::command().render_help());
        return DnsGenExitCode::ConfigError.into();
    }

    let config = cli.into_config();
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        return DnsGenExitCode::ConfigError.into();
    }

    let log_level = if config.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsGenExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            return DnsGenExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DnsGenExitCode::CleanShutdown,
            Err(e) => {
                error!("dnsgen error: {:#}", e);
                DnsGenExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the supervisor and run it until a shutdown signal arrives
async fn run_daemon(config: DnsGenConfig) -> Result<()> {
    // Nothing observes engine events here; releasing the receiver closes the channel
    let (supervisor, _) = Supervisor::new(config, Arc::new(SystemResolver::new()))?;

    supervisor.run().await?;

    info!("Shutting down");
    Ok(())
}
