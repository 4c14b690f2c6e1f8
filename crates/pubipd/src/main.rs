// # pubipd - public address echo daemon
//
// The pubipd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Binding the listener and spawning the refresh loop
// 4. Serving until a shutdown signal arrives
//
// ## Configuration
//
// All configuration is done via environment variables, each with a default
// so the daemon runs with none set:
//
// - `PUBIP_ECHO_URL`: Upstream echo endpoint (default https://icanhazip.com)
// - `PUBIP_REFRESH_INTERVAL`: Seconds between probes (default 1800)
// - `PUBIP_PROBE_TIMEOUT`: Outbound request timeout in seconds (default 10)
// - `PUBIP_LISTEN_ADDR`: Listen address (default 0.0.0.0:6969)
// - `PUBIP_LOG_LEVEL`: trace|debug|info|warn|error (default info)
//
// ## Example
//
// ```bash
// export PUBIP_ECHO_URL=https://api.ipify.org
// export PUBIP_REFRESH_INTERVAL=600
//
// pubipd
// ```

use anyhow::Result;
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use pubip_core::config::{
    DEFAULT_ECHO_URL, DEFAULT_LISTEN_ADDR, DEFAULT_PROBE_TIMEOUT_SECS,
    DEFAULT_REFRESH_INTERVAL_SECS, ProbeConfig, RefreshConfig, ServerConfig, ServiceConfig,
};
use pubip_core::traits::ProbeFactory;
use pubip_core::{AddressCache, Refresher};
use pubip_probe_http::HttpProbeFactory;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ServiceExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ServiceExitCode> for ExitCode {
    fn from(code: ServiceExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    echo_url: String,
    refresh_interval_secs: u64,
    probe_timeout_secs: u64,
    listen_addr: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            echo_url: env::var("PUBIP_ECHO_URL").unwrap_or_else(|_| DEFAULT_ECHO_URL.to_string()),
            refresh_interval_secs: parse_env_secs(
                "PUBIP_REFRESH_INTERVAL",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )?,
            probe_timeout_secs: parse_env_secs("PUBIP_PROBE_TIMEOUT", DEFAULT_PROBE_TIMEOUT_SECS)?,
            listen_addr: env::var("PUBIP_LISTEN_ADDR")
                .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string()),
            log_level: env::var("PUBIP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// The typed `ServiceConfig` validates itself again before use; this
    /// pass exists to reject bad input with env-var-specific diagnostics
    /// before anything else starts.
    fn validate(&self) -> Result<()> {
        if self.echo_url.is_empty() {
            anyhow::bail!("PUBIP_ECHO_URL cannot be empty");
        }

        if !self.echo_url.starts_with("https://") && !self.echo_url.starts_with("http://") {
            anyhow::bail!(
                "PUBIP_ECHO_URL must use HTTP or HTTPS scheme. Got: {}",
                self.echo_url
            );
        }

        if self.echo_url.starts_with("http://") {
            eprintln!(
                "WARNING: PUBIP_ECHO_URL uses HTTP (not HTTPS). \
                 This is less secure. Consider using HTTPS."
            );
        }

        if !(10..=86_400).contains(&self.refresh_interval_secs) {
            anyhow::bail!(
                "PUBIP_REFRESH_INTERVAL must be between 10 and 86400 seconds. Got: {}",
                self.refresh_interval_secs
            );
        }

        if !(1..=300).contains(&self.probe_timeout_secs) {
            anyhow::bail!(
                "PUBIP_PROBE_TIMEOUT must be between 1 and 300 seconds. Got: {}",
                self.probe_timeout_secs
            );
        }

        if self.probe_timeout_secs >= self.refresh_interval_secs {
            anyhow::bail!(
                "PUBIP_PROBE_TIMEOUT ({}) must be below PUBIP_REFRESH_INTERVAL ({})",
                self.probe_timeout_secs,
                self.refresh_interval_secs
            );
        }

        if self.listen_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!(
                "PUBIP_LISTEN_ADDR is not a valid socket address. Got: {}",
                self.listen_addr
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "PUBIP_LOG_LEVEL '{}' is not valid. \
                 Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the typed service configuration
    fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            probe: ProbeConfig::Http {
                url: self.echo_url.clone(),
                timeout_secs: self.probe_timeout_secs,
            },
            refresh: RefreshConfig {
                interval_secs: self.refresh_interval_secs,
                ..RefreshConfig::default()
            },
            server: ServerConfig {
                listen_addr: self
                    .listen_addr
                    .parse()
                    .expect("listen address validated above"),
            },
        }
    }
}

/// Read an integer-seconds environment variable, defaulting when unset
fn parse_env_secs(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be an integer number of seconds. Got: {}", name, value)),
        Err(_) => Ok(default),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ServiceExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ServiceExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ServiceExitCode::ConfigError.into();
    }

    info!("Starting pubipd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ServiceExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => ServiceExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                ServiceExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let service_config = config.to_service_config();
    service_config.validate()?;

    info!("Echo endpoint: {}", config.echo_url);
    info!("Refresh interval: {}s", config.refresh_interval_secs);

    let cache = AddressCache::new();

    let probe = HttpProbeFactory.create(&service_config.probe)?;
    // The refresher logs for itself; nothing consumes the event stream here.
    let (refresher, _) = Refresher::new(probe, cache.clone(), service_config.refresh.clone())?;

    // Bind before spawning anything; a bind failure is fatal.
    let listener = tokio::net::TcpListener::bind(service_config.server.listen_addr)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to bind {}: {}",
                service_config.server.listen_addr,
                e
            )
        })?;

    let (refresh_shutdown_tx, refresh_shutdown_rx) = tokio::sync::oneshot::channel();
    let (server_shutdown_tx, server_shutdown_rx) = tokio::sync::oneshot::channel();

    let refresh_handle = tokio::spawn(async move {
        if let Err(e) = refresher.run_with_shutdown(Some(refresh_shutdown_rx)).await {
            error!("Refresh loop error: {}", e);
        }
    });

    let server_cache = cache.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = pubip_core::server::serve(listener, server_cache, server_shutdown_rx).await
        {
            error!("Server error: {}", e);
        }
    });

    let received = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", received);

    let _ = refresh_shutdown_tx.send(());
    let _ = server_shutdown_tx.send(());

    refresh_handle.await?;
    server_handle.await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(received)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
