//! Background refresh loop
//!
//! The Refresher keeps the address cache warm so the request path never
//! touches the upstream:
//!
//! ```text
//! ┌──────────────┐   fetch()   ┌──────────────┐
//! │ AddressProbe │ ──────────▶ │  Refresher   │
//! └──────────────┘             └──────────────┘
//!                                  │        │
//!                        store     │        │  emit
//!                                  ▼        ▼
//!                          ┌──────────────┐  ┌─────────────┐
//!                          │ AddressCache │  │   Events    │
//!                          └──────────────┘  └─────────────┘
//! ```
//!
//! ## Schedule
//!
//! The first probe runs inline on entry, so the address is typically
//! available within one upstream round-trip of start-up. After every attempt
//! the loop sleeps for the full refresh interval, the same on success and on
//! failure, with no back-off and no jitter.
//!
//! ## Failure containment
//!
//! A failed probe is logged and emitted as an event; the cache keeps the
//! last-known-good value untouched. Probe errors never escape the loop.

use crate::cache::AddressCache;
use crate::config::RefreshConfig;
use crate::error::Result;
use crate::traits::AddressProbe;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, info, warn};

/// Events emitted by the Refresher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// Refresh loop entered
    Started,

    /// A probe succeeded and the cache was updated
    Refreshed {
        ip: IpAddr,
        previous: Option<IpAddr>,
    },

    /// A probe failed; the cache was left untouched
    ProbeFailed {
        error: String,
        consecutive_failures: usize,
    },

    /// Refresh loop exited
    Stopped { reason: String },
}

/// Background refresh loop
///
/// ## Lifecycle
///
/// 1. Create with [`Refresher::new()`]
/// 2. Drive with [`Refresher::run()`] (stops on ctrl-c) or
///    [`Refresher::run_with_shutdown()`] (stops when the caller says so)
/// 3. The loop has no terminal condition of its own; it exits only on a
///    shutdown signal
///
/// ## Threading
///
/// The loop runs on a single async task. The cache handle it writes through
/// is shared with any number of concurrent readers.
pub struct Refresher {
    /// Probe for observing the public address
    probe: Box<dyn AddressProbe>,

    /// Shared cache this loop writes through
    cache: AddressCache,

    /// Delay between successive probe attempts
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<RefreshEvent>,
}

impl Refresher {
    /// Create a new refresher from configuration
    ///
    /// # Returns
    ///
    /// A tuple of (refresher, event_receiver) where event_receiver yields
    /// refresh events
    pub fn new(
        probe: Box<dyn AddressProbe>,
        cache: AddressCache,
        config: RefreshConfig,
    ) -> Result<(Self, mpsc::Receiver<RefreshEvent>)> {
        config.validate()?;

        Ok(Self::with_interval(
            probe,
            cache,
            Duration::from_secs(config.interval_secs),
            config.event_channel_capacity,
        ))
    }

    /// Create a refresher with an explicit interval, bypassing configuration
    ///
    /// Tests use this for sub-second intervals.
    pub fn with_interval(
        probe: Box<dyn AddressProbe>,
        cache: AddressCache,
        interval: Duration,
        event_channel_capacity: usize,
    ) -> (Self, mpsc::Receiver<RefreshEvent>) {
        let (tx, rx) = mpsc::channel(event_channel_capacity);

        let refresher = Self {
            probe,
            cache,
            interval,
            event_tx: tx,
        };

        (refresher, rx)
    }

    /// Run the refresh loop until a ctrl-c signal arrives
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the refresh loop until `shutdown_rx` fires
    ///
    /// The daemon uses this to coordinate shutdown across tasks; tests use
    /// it to start and stop loops deterministically.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(RefreshEvent::Started);

        let mut consecutive_failures = 0usize;

        if let Some(mut rx) = shutdown_rx {
            // Coordinated mode: stop when the provided signal fires
            loop {
                self.refresh_once(&mut consecutive_failures).await;

                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}

                    _ = &mut rx => {
                        info!("Shutdown signal received");
                        self.emit_event(RefreshEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Self-contained mode: stop on SIGINT
            loop {
                self.refresh_once(&mut consecutive_failures).await;

                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}

                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received");
                        self.emit_event(RefreshEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Perform a single probe attempt and apply its outcome
    async fn refresh_once(&self, consecutive_failures: &mut usize) {
        match self.probe.fetch().await {
            Ok(ip) => {
                *consecutive_failures = 0;
                let previous = self.cache.store(ip).await;
                info!("Public IP updated to: {}", ip);
                self.emit_event(RefreshEvent::Refreshed { ip, previous });
            }
            Err(e) => {
                *consecutive_failures += 1;
                error!("Error refreshing IP: {}", e);
                self.emit_event(RefreshEvent::ProbeFailed {
                    error: e.to_string(),
                    consecutive_failures: *consecutive_failures,
                });
            }
        }
    }

    /// Emit a refresh event
    fn emit_event(&self, event: RefreshEvent) {
        // Dropping is preferable to blocking the loop on a slow consumer.
        // A closed channel just means nobody is listening.
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Event channel full, dropping event"),
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
