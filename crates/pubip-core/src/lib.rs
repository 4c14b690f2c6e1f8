// # pubip-core
//
// Core library for the pubip public address echo service.
//
// ## Architecture Overview
//
// This library provides everything but the I/O-specific probe and the
// daemon shell:
// - **AddressProbe**: Trait for observing the public address via an
//   upstream echo endpoint
// - **AddressCache**: Shared last-known-good address (one writer, many
//   readers)
// - **Refresher**: Background loop that keeps the cache warm on a fixed
//   schedule
// - **server**: HTTP front-end that reports the cached address as JSON
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Scheduling, caching, and serving are
//    separate from probe I/O
// 2. **Failure-Preserving**: A failed probe never clears the last-known-good
//    value
// 3. **Library-First**: The daemon is a thin shell; everything here can be
//    embedded and driven from tests

pub mod traits;
pub mod cache;
pub mod refresh;
pub mod server;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{AddressProbe, ProbeFactory};
pub use cache::{AddressCache, AddressSnapshot};
pub use refresh::{Refresher, RefreshEvent};
pub use server::AddressResponse;
pub use config::{ProbeConfig, RefreshConfig, ServerConfig, ServiceConfig};
pub use error::{Error, Result};
