// # Resolver Trait
//
// Defines the interface for forward hostname resolution.
//
// ## Implementations
//
// - System resolver (getaddrinfo via tokio): `resolver::SystemResolver`
// - Test doubles: scripted resolvers in the contract tests
//
// ## Usage
//
// ```rust,ignore
// use dnsgen_core::Resolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* Resolver implementation */;
//
//     // Sorted, stable address list
//     let addresses = resolver.resolve("svc.internal").await?;
//     println!("{:?}", addresses);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::ResolveError;

/// Trait for hostname resolver implementations
///
/// Implementations must be thread-safe: one resolver is shared by every
/// host monitor and by the `lookupHost` template function.
///
/// # Contract
///
/// - On success, addresses are returned sorted lexicographically so two
///   lookups of an unchanged record compare equal.
/// - On failure, the error is classified as temporary or permanent
///   (see [`ResolveError`]). Callers never interpret a failure as
///   "no addresses".
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a hostname to its sorted address list
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: Addresses in textual form, sorted
    /// - `Err(ResolveError)`: Classified resolution failure
    async fn resolve(&self, hostname: &str) -> Result<Vec<String>, ResolveError>;
}
