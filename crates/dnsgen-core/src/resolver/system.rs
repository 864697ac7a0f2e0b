// # System Resolver
//
// Resolver backed by the host's own name resolution (getaddrinfo), so
// /etc/hosts, nsswitch and the configured nameservers all apply.
//
// ## Behavior
//
// - Forward lookup only (A/AAAA as the host resolver sees fit)
// - Addresses are rendered as plain IP strings, sorted and de-duplicated
// - Errors are classified as temporary or permanent

use async_trait::async_trait;
use std::time::Instant;

use crate::error::ResolveError;
use crate::traits::Resolver;

/// Hostname resolver using the system resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    /// Create a new system resolver
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<String>, ResolveError> {
        let start = Instant::now();

        // Port is irrelevant; getaddrinfo only needs a service to build sockaddrs
        let addrs = tokio::net::lookup_host((hostname, 0))
            .await
            .map_err(|e| ResolveError::from_io(hostname, e))?;

        let addresses = normalize(addrs.map(|addr| addr.ip().to_string()).collect());

        tracing::trace!(
            "getaddrinfo {} returned {} address(es) in {:?}",
            hostname,
            addresses.len(),
            start.elapsed()
        );
        Ok(addresses)
    }
}

/// Sort an address list and drop duplicates
pub fn normalize(mut addresses: Vec<String>) -> Vec<String> {
    addresses.sort();
    addresses.dedup();
    addresses
}
