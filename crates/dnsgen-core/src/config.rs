//! Configuration types for dnsgen
//!
//! This module defines the configuration consumed by the [`Supervisor`](crate::Supervisor)
//! and the helpers used to validate it before any monitoring starts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main dnsgen configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsGenConfig {
    /// Interval between DNS queries for each hostname
    #[serde(default = "default_interval")]
    pub interval: Duration,

    /// Shell command to execute when a change is detected
    #[serde(default)]
    pub command: Option<String>,

    /// Template to render on every change
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Where the rendered template goes (stdout when unset)
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,

    /// Hostnames to watch for updates
    pub hostnames: Vec<String>,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl DnsGenConfig {
    /// Create a configuration watching the given hostnames with defaults
    pub fn new<I, S>(hostnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interval: default_interval(),
            command: None,
            template: None,
            destination: None,
            debug: false,
            hostnames: hostnames.into_iter().map(Into::into).collect(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the polling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the command to run on change
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the template to render on change
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the output destination for the rendered template
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Enable or disable debug logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Validate the configuration
    ///
    /// These are the only fatal errors in the system: they are reported before
    /// any task is started.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.hostnames.is_empty() {
            return Err(crate::Error::config("No hostnames provided"));
        }

        if let Some(hostname) = self.hostnames.iter().find(|h| h.trim().is_empty()) {
            return Err(crate::Error::config(format!(
                "Invalid hostname: '{}'",
                hostname
            )));
        }

        if self.interval.is_zero() {
            return Err(crate::Error::config("Interval must be greater than zero"));
        }

        if let Some(template) = &self.template
            && !template.exists()
        {
            return Err(crate::Error::config(format!(
                "template file not found: {}",
                template.display()
            )));
        }

        Ok(())
    }

    /// The template path, if rendering is configured
    pub fn template_path(&self) -> Option<&Path> {
        self.template.as_deref()
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Parse a duration string such as `5s`, `1m30s`, `250ms` or `1.5h`
///
/// Accepted units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is
/// allowed; any other number must carry a unit.
pub fn parse_duration(input: &str) -> Result<Duration, crate::Error> {
    let invalid = || crate::Error::config(format!("invalid duration: '{}'", input));

    let s = input.trim();
    if s.is_empty() {
        return Err(invalid());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1e0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total += value * nanos_per_unit;
    }

    if !total.is_finite() || total > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_durations() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_compound_and_fractional_durations() {
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5 parsecs").is_err());
        assert!(parse_duration("10d").is_err());
    }

    #[test]
    fn test_validate_requires_hostnames() {
        let config = DnsGenConfig::new(Vec::<String>::new());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("No hostnames provided"));
    }

    #[test]
    fn test_validate_rejects_missing_template() {
        let config = DnsGenConfig::new(["svc.internal"]).with_template("/nonexistent/dnsgen.tmpl");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("template file not found"));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = DnsGenConfig::new(["svc.internal"]).with_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = DnsGenConfig::new(["svc.internal"]);
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(config.command.is_none());
        assert!(config.template.is_none());
        assert!(config.destination.is_none());
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }
}
