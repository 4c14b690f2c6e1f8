// # Address Cache
//
// Shared last-known-good address.
//
// ## Purpose
//
// Holds at most one observed address. The refresh loop is the sole writer;
// request handlers are concurrent readers. The cache starts unpopulated and
// becomes populated on the first successful probe; it never returns to the
// unpopulated state afterwards, and a failed probe never touches it.
//
// ## Concurrency
//
// A `tokio::sync::RwLock` over an `Option<AddressSnapshot>`: readers clone
// the snapshot out under the read lock, the writer replaces it whole under
// the write lock. Readers therefore see either the pre-write or the
// post-write snapshot, never a mixture.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// A single observed address with its observation time
///
/// `observed_at` is diagnostic only; it never appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSnapshot {
    /// The observed public address
    pub ip: IpAddr,
    /// When the refresh loop installed this snapshot
    pub observed_at: DateTime<Utc>,
}

impl AddressSnapshot {
    /// Create a snapshot stamped with the current time
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            observed_at: Utc::now(),
        }
    }
}

/// Cheaply cloneable handle to the shared address cache
///
/// # Example
///
/// ```rust,no_run
/// use pubip_core::AddressCache;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = AddressCache::new();
///     assert!(cache.read().await.is_none());
///
///     cache.store("1.2.3.4".parse().unwrap()).await;
///     assert_eq!(
///         cache.read().await.unwrap().ip,
///         "1.2.3.4".parse::<std::net::IpAddr>().unwrap()
///     );
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AddressCache {
    inner: Arc<RwLock<Option<AddressSnapshot>>>,
}

impl AddressCache {
    /// Create a new unpopulated cache
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Read the current snapshot
    ///
    /// Returns `None` until the first successful probe completes. Many
    /// callers may read concurrently without blocking each other.
    pub async fn read(&self) -> Option<AddressSnapshot> {
        self.inner.read().await.clone()
    }

    /// Whether a successful probe has populated the cache yet
    pub async fn is_populated(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Install a fresh snapshot for `ip`
    ///
    /// Returns the previously held address, if any.
    pub async fn store(&self, ip: IpAddr) -> Option<IpAddr> {
        let mut guard = self.inner.write().await;
        let previous = guard.as_ref().map(|snapshot| snapshot.ip);
        *guard = Some(AddressSnapshot::new(ip));
        previous
    }
}
