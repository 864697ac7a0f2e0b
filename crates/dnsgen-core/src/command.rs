//! Shell command execution
//!
//! The configured command runs through `/bin/sh -c` so operators can use
//! pipes, redirects and `&&` chains exactly as they would on a shell.

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::error::CommandError;

/// Shell used to interpret command strings
const SHELL: &str = "/bin/sh";

/// Result of a successful command run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured stdout followed by captured stderr
    pub output: String,
    /// Wall-clock run time
    pub elapsed: Duration,
}

/// A shell command to run on every reaction
#[derive(Debug, Clone)]
pub struct ShellCommand {
    command: String,
}

impl ShellCommand {
    /// Wrap a command string
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Run the command to completion, capturing its combined output
    ///
    /// Completion is always logged with the elapsed time. Output is logged as
    /// an error when the command fails and at debug level otherwise.
    pub async fn run(&self) -> Result<CommandOutput, CommandError> {
        let start = Instant::now();
        debug!("running command [{}]...", self.command);

        let output = Command::new(SHELL)
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let elapsed = start.elapsed();
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        info!("ran command [{}] in {:?}", self.command, elapsed);

        if !output.status.success() {
            error!(
                "command [{}] failed with output: {}",
                self.command, combined
            );
            return Err(CommandError::Failed {
                command: self.command.clone(),
                status: output.status,
                output: combined,
            });
        }

        debug!("output: {}", combined);
        Ok(CommandOutput {
            output: combined,
            elapsed,
        })
    }
}
