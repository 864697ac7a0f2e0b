//! Core traits for dnsgen
//!
//! This module defines the abstract interfaces that implementations must follow.
//!
//! - [`Resolver`]: Resolve a hostname to its current address set

pub mod resolver;

pub use resolver::Resolver;
