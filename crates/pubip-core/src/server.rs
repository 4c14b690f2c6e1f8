//! HTTP front-end
//!
//! Serves the cached address. `GET` on any path reads the cache and returns
//! either the address as JSON or a plain-text 503 while the cache is still
//! cold. The handler does no I/O besides writing the response; a blocked
//! probe in the refresh loop never delays a reader.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use crate::cache::AddressCache;
use crate::error::Result;

/// Body returned while no probe has succeeded yet
pub const COLD_START_BODY: &str = "Public IP not yet available. Please try again later.";

/// The wire object returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressResponse {
    /// The cached public address
    pub ip: String,
}

/// Build the service router
///
/// The fallback serves the same handler as `/`: the service answers on
/// every path.
pub fn router(cache: AddressCache) -> Router {
    Router::new()
        .route("/", get(address))
        .fallback(address)
        .with_state(cache)
}

/// Serve the router on `listener` until `shutdown_rx` fires
///
/// Binding is the caller's job; a bind failure is a fatal start-up error
/// and is handled in the daemon.
pub async fn serve(
    listener: TcpListener,
    cache: AddressCache,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Server is running on {}", addr);

    axum::serve(listener, router(cache))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await?;

    Ok(())
}

/// Handler: report the cached address
async fn address(State(cache): State<AddressCache>) -> Response {
    match cache.read().await {
        Some(snapshot) => Json(AddressResponse {
            ip: snapshot.ip.to_string(),
        })
        .into_response(),

        None => (StatusCode::SERVICE_UNAVAILABLE, COLD_START_BODY).into_response(),
    }
}
