// # Address Probe Trait
//
// Defines the interface for observing the machine's public address via an
// external echo endpoint.
//
// ## Implementations
//
// - HTTP-based: `pubip-probe-http` crate
// - Future: DNS-based resolvers (OpenDNS `myip.opendns.com`), STUN
//
// ## Usage
//
// ```rust,ignore
// use pubip_core::AddressProbe;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let probe = /* AddressProbe implementation */;
//
//     let ip = probe.fetch().await?;
//     println!("observed address: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for probe implementations
///
/// A probe performs exactly one upstream lookup per call. Scheduling,
/// retries, and caching of the observed address all live in the
/// [`Refresher`](crate::refresh::Refresher); a probe is an **observer**,
/// not a decision-maker.
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Rules for implementations
///
/// - One outbound request per `fetch()` call, no internal retries
/// - No sleeping or polling loops; the refresh loop owns the schedule
/// - No writes to the address cache; the refresh loop is the sole writer
#[async_trait]
pub trait AddressProbe: Send + Sync {
    /// Observe the current public address.
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The address the upstream echoed back
    /// - `Err(Error)`: Transport failure, non-success status, or a body
    ///   that does not parse as an address
    async fn fetch(&self) -> Result<IpAddr, crate::Error>;
}

/// Helper trait for constructing probes from configuration
pub trait ProbeFactory: Send + Sync {
    /// Create an AddressProbe instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this probe type
    ///
    /// # Returns
    ///
    /// A boxed AddressProbe trait object
    fn create(
        &self,
        config: &crate::config::ProbeConfig,
    ) -> Result<Box<dyn AddressProbe>, crate::Error>;
}
