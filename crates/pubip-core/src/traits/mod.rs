//! Core traits for the pubip service
//!
//! - [`AddressProbe`]: Observe the public address via an upstream echo endpoint
//! - [`ProbeFactory`]: Construct probes from configuration

pub mod probe;

pub use probe::{AddressProbe, ProbeFactory};
