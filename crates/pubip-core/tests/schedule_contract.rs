//! Contract test: schedule adherence
//!
//! Constraints verified:
//! - The first probe runs inline on entry, well before one interval elapses
//! - Successive probes are separated by at least the refresh interval
//! - Failures wait the same interval as successes: no fast retry, no back-off

mod common;

use common::*;
use pubip_core::{AddressCache, Refresher};
use std::time::Duration;

// Margin for timestamp capture around the sleep itself.
const SLACK: Duration = Duration::from_millis(10);

#[tokio::test]
async fn first_probe_runs_inline_on_entry() {
    let cache = AddressCache::new();
    let (probe, control) = ControlledProbe::ok("1.2.3.4");

    let (refresher, mut events) = Refresher::with_interval(
        Box::new(probe),
        cache,
        Duration::from_secs(3600),
        8,
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { refresher.run_with_shutdown(Some(shutdown_rx)).await });

    // Arrives within the bounded wait, hours before the first interval ends.
    wait_for_refreshed(&mut events).await;
    assert_eq!(control.call_count(), 1);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn successive_probes_wait_the_full_interval() {
    let interval = Duration::from_millis(200);
    let cache = AddressCache::new();
    let (probe, control) = ControlledProbe::ok("1.2.3.4");

    let (refresher, mut events) =
        Refresher::with_interval(Box::new(probe), cache, interval, 32);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { refresher.run_with_shutdown(Some(shutdown_rx)).await });

    for _ in 0..3 {
        wait_for_refreshed(&mut events).await;
    }

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    let times = control.call_times();
    assert!(times.len() >= 3);
    for pair in times.windows(2) {
        let gap = pair[1].duration_since(pair[0]);
        assert!(
            gap + SLACK >= interval,
            "probes fired {}ms apart, interval is {}ms",
            gap.as_millis(),
            interval.as_millis()
        );
    }
}

#[tokio::test]
async fn failures_wait_the_same_interval() {
    let interval = Duration::from_millis(200);
    let cache = AddressCache::new();
    let (probe, control) = ControlledProbe::failing("connection refused");

    let (refresher, mut events) =
        Refresher::with_interval(Box::new(probe), cache, interval, 32);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { refresher.run_with_shutdown(Some(shutdown_rx)).await });

    for _ in 0..3 {
        wait_for_probe_failed(&mut events).await;
    }

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    let times = control.call_times();
    assert!(times.len() >= 3);
    for pair in times.windows(2) {
        let gap = pair[1].duration_since(pair[0]);
        assert!(
            gap + SLACK >= interval,
            "failed probes retried after {}ms, interval is {}ms",
            gap.as_millis(),
            interval.as_millis()
        );
    }
}
