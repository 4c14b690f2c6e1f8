// # HTTP Address Probe
//
// This crate provides the HTTP-based probe for the pubip service.
//
// ## Architecture
//
// One `fetch()` call performs one GET against an external echo endpoint
// (e.g. icanhazip.com, api.ipify.org) and parses the body as the observed
// address. Scheduling and caching live in `pubip-core`; this crate only
// does the upstream I/O.
//
// ## Behaviour notes
//
// - The response body is trimmed before parsing, so the trailing newline
//   most echo endpoints emit never reaches the cache.
// - A non-2xx status is a probe failure; an error page body is never
//   mistaken for an address.
// - The client carries a bounded request timeout. A hung upstream costs at
//   most one timeout, not the whole refresh schedule.

use pubip_core::config::ProbeConfig;
use pubip_core::traits::{AddressProbe, ProbeFactory};
use pubip_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Well-known echo endpoints (for future failover support)
#[allow(dead_code)]
const ECHO_SERVICES: &[&str] = &[
    "https://icanhazip.com",  // No rate limit documented
    "https://api.ipify.org",  // Returns plain text IP
    "https://ifconfig.me/ip", // No rate limit documented
];

/// HTTP-based address probe
pub struct HttpProbe {
    /// URL of the echo endpoint
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a new HTTP probe
    ///
    /// # Parameters
    ///
    /// - `url`: Echo endpoint to query (e.g. "https://icanhazip.com")
    /// - `timeout`: Outbound request timeout
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            url,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl AddressProbe for HttpProbe {
    async fn fetch(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::probe(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::probe(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::probe(format!("Failed to read response: {}", e)))?;

        let body = body.trim();

        // An empty body trips this too; the cache never holds a non-address.
        body.parse()
            .map_err(|_| Error::probe(format!("Invalid IP address: {:?}", body)))
    }
}

/// Factory for creating HTTP probes
pub struct HttpProbeFactory;

impl ProbeFactory for HttpProbeFactory {
    fn create(&self, config: &ProbeConfig) -> Result<Box<dyn AddressProbe>> {
        match config {
            ProbeConfig::Http { url, timeout_secs } => Ok(Box::new(HttpProbe::new(
                url.clone(),
                Duration::from_secs(*timeout_secs),
            ))),
        }
    }
}
