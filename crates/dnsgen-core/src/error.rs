//! Error types for dnsgen
//!
//! This module defines all error types used throughout the crate.
//! Per-stage errors ([`ResolveError`], [`WriteError`], [`CommandError`]) are
//! handled and logged where they occur; [`Error`] covers the failures that
//! reach a caller (startup validation, template rendering, subscriptions).

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for dnsgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dnsgen
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration and startup validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template load or render errors
    #[error("Template error: {0}")]
    Template(String),

    /// Filesystem watch errors
    #[error("Watch error: {0}")]
    Watch(String),

    /// Signal subscription errors
    #[error("Signal error: {0}")]
    Signal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Create a watch error
    pub fn watch(msg: impl Into<String>) -> Self {
        Self::Watch(msg.into())
    }

    /// Create a signal error
    pub fn signal(msg: impl Into<String>) -> Self {
        Self::Signal(msg.into())
    }
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Self::Watch(err.to_string())
    }
}

/// Hostname resolution failure
///
/// Both kinds leave the last-known address set untouched; the distinction
/// only decides how the failure is reported.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The resolver reported a transient condition; retry on the next poll
    #[error("temporary error resolving {hostname}: {source}")]
    Temporary {
        hostname: String,
        #[source]
        source: io::Error,
    },

    /// Any other resolver failure
    #[error("error resolving {hostname}: {source}")]
    Permanent {
        hostname: String,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// Classify an I/O error returned by the host resolver
    pub fn from_io(hostname: impl Into<String>, source: io::Error) -> Self {
        let hostname = hostname.into();
        if is_transient(&source) {
            Self::Temporary { hostname, source }
        } else {
            Self::Permanent { hostname, source }
        }
    }

    /// Whether the caller should simply retry on the next poll
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary { .. })
    }
}

/// getaddrinfo failures surface as uncategorized I/O errors, so EAI_AGAIN is
/// only recognizable by its message.
fn is_transient(err: &io::Error) -> bool {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => true,
        _ => {
            let msg = err.to_string().to_lowercase();
            msg.contains("temporary failure") || msg.contains("try again")
        }
    }
}

/// Output file replacement failure, one variant per stage
///
/// The destination is never touched when any of these is returned.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("error creating temp file: {0}")]
    CreateTemp(#[source] io::Error),

    #[error("error writing temp file: {0}")]
    WriteTemp(#[source] io::Error),

    #[error("error reading file metadata: {0}")]
    Stat(#[source] io::Error),

    #[error("error setting file permissions: {0}")]
    Permissions(#[source] io::Error),

    #[error("error changing file owner: {0}")]
    Ownership(#[source] io::Error),

    #[error("error comparing old version: {0}")]
    ReadExisting(#[source] io::Error),

    #[error("error creating output file: {0}")]
    Rename(#[source] io::Error),

    #[error("error writing to stdout: {0}")]
    Stdout(#[source] io::Error),
}

/// Shell command failure
#[derive(Error, Debug)]
pub enum CommandError {
    /// The shell could not be started
    #[error("failed to launch command [{command}]: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The command ran and exited unsuccessfully
    #[error("command [{command}] exited with {status}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_temporary() {
        let err = ResolveError::from_io("svc.internal", io::Error::from(io::ErrorKind::TimedOut));
        assert!(err.is_temporary());
        assert!(err.to_string().contains("svc.internal"));
    }

    #[test]
    fn test_eai_again_message_is_temporary() {
        let source = io::Error::other(
            "failed to lookup address information: Temporary failure in name resolution",
        );
        assert!(ResolveError::from_io("svc.internal", source).is_temporary());
    }

    #[test]
    fn test_unknown_host_is_permanent() {
        let source = io::Error::other(
            "failed to lookup address information: Name or service not known",
        );
        let err = ResolveError::from_io("nope.invalid", source);
        assert!(!err.is_temporary());
        assert!(err.to_string().contains("nope.invalid"));
    }
}
