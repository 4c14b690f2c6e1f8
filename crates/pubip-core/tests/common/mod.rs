//! Test doubles and common utilities for the contract tests
//!
//! Each contract binary pulls in the doubles it needs; not every binary
//! uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use pubip_core::AddressCache;
use pubip_core::error::{Error, Result};
use pubip_core::refresh::RefreshEvent;
use pubip_core::server;
use pubip_core::traits::AddressProbe;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

/// Shared control handle for a [`ControlledProbe`]
///
/// Lets a test flip the probe outcome while a refresh loop is running, and
/// inspect when each probe attempt happened.
#[derive(Clone)]
pub struct ProbeControl {
    outcome: Arc<Mutex<std::result::Result<IpAddr, String>>>,
    calls: Arc<Mutex<Vec<Instant>>>,
}

impl ProbeControl {
    /// Make subsequent probes succeed with `ip`
    pub fn set_ok(&self, ip: IpAddr) {
        *self.outcome.lock().unwrap() = Ok(ip);
    }

    /// Make subsequent probes fail with `msg`
    pub fn set_err(&self, msg: &str) {
        *self.outcome.lock().unwrap() = Err(msg.to_string());
    }

    /// Number of probe attempts so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Timestamps of every probe attempt so far
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

/// A probe whose outcome the test controls at runtime
pub struct ControlledProbe {
    control: ProbeControl,
}

impl ControlledProbe {
    /// Create a probe that succeeds with `ip`
    pub fn ok(ip: &str) -> (Self, ProbeControl) {
        Self::with_outcome(Ok(ip.parse().expect("test address parses")))
    }

    /// Create a probe that fails with `msg`
    pub fn failing(msg: &str) -> (Self, ProbeControl) {
        Self::with_outcome(Err(msg.to_string()))
    }

    fn with_outcome(outcome: std::result::Result<IpAddr, String>) -> (Self, ProbeControl) {
        let control = ProbeControl {
            outcome: Arc::new(Mutex::new(outcome)),
            calls: Arc::new(Mutex::new(Vec::new())),
        };

        (
            Self {
                control: control.clone(),
            },
            control,
        )
    }
}

#[async_trait]
impl AddressProbe for ControlledProbe {
    async fn fetch(&self) -> Result<IpAddr> {
        self.control.calls.lock().unwrap().push(Instant::now());

        match self.control.outcome.lock().unwrap().clone() {
            Ok(ip) => Ok(ip),
            Err(msg) => Err(Error::probe(msg)),
        }
    }
}

/// A probe that never completes (for reader-independence tests)
pub struct HangingProbe;

#[async_trait]
impl AddressProbe for HangingProbe {
    async fn fetch(&self) -> Result<IpAddr> {
        std::future::pending().await
    }
}

/// Start the front-end on an OS-assigned port, returning the bound address
/// and the shutdown trigger.
pub async fn start_server(cache: AddressCache) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        server::serve(listener, cache, shutdown_rx).await.unwrap();
    });

    // Give the server a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown_tx)
}

/// Issue a GET against the front-end root
pub async fn get(addr: SocketAddr) -> reqwest::Response {
    reqwest::get(format!("http://{}/", addr)).await.unwrap()
}

/// Receive events until the next `Refreshed`, with a bounded wait
pub async fn wait_for_refreshed(events: &mut mpsc::Receiver<RefreshEvent>) -> RefreshEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("a refresh event within 5s")
            .expect("event channel open");

        if matches!(event, RefreshEvent::Refreshed { .. }) {
            return event;
        }
    }
}

/// Receive events until the next `ProbeFailed`, with a bounded wait
pub async fn wait_for_probe_failed(events: &mut mpsc::Receiver<RefreshEvent>) -> RefreshEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("a refresh event within 5s")
            .expect("event channel open");

        if matches!(event, RefreshEvent::ProbeFailed { .. }) {
            return event;
        }
    }
}
