//! Store and request metrics
//!
//! Recording goes through the `metrics` facade and is free until a recorder
//! is installed. [`MetricsServer::start`] installs the Prometheus recorder
//! together with its scrape listener.
//!
//! ```rust,no_run
//! use shopdesk_runtime::metrics::MetricsServer;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

const COUNTERS: &[(&str, &str)] = &[
    ("store.commands.total", "Actions applied by the reducer"),
    ("store.effects.executed", "Effects started, by type"),
    ("store.effects.cancelled", "Running effects aborted by a cancel"),
    ("store.shutdown.initiated", "Graceful shutdowns started"),
    ("store.shutdown.timeout", "Graceful shutdowns that gave up"),
    ("store.shutdown.rejected_actions", "Actions refused during shutdown"),
    ("api.requests.total", "Backend requests, by domain and operation"),
    ("api.requests.failed", "Backend requests that settled as rejected"),
];

const HISTOGRAMS: &[(&str, &str)] = &[
    ("store.reducer.duration_seconds", "Reducer time per action"),
    ("store.effects.count", "Effects returned per action"),
    ("api.request.duration_seconds", "Backend request latency"),
];

/// The Prometheus exporter could not be set up
#[derive(Error, Debug)]
#[error("Failed to start metrics exporter: {0}")]
pub struct MetricsError(#[from] BuildError);

/// Prometheus exporter bound to a scrape address
#[derive(Debug)]
pub struct MetricsServer {
    addr: SocketAddr,
    running: bool,
}

impl MetricsServer {
    /// Exporter that will listen on `addr` once started
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, running: false }
    }

    /// Install the global recorder and start serving `/metrics`
    ///
    /// Must be called inside a tokio runtime. If another recorder is already
    /// installed the call logs a warning and leaves that one in place.
    ///
    /// # Errors
    ///
    /// [`MetricsError`] when the exporter cannot be built or the listener
    /// cannot be started.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        describe_all();

        let installed = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), LATENCY_BUCKETS)?
            .with_http_listener(self.addr)
            .install();

        match installed {
            Ok(()) => {
                self.running = true;
                tracing::info!(addr = %self.addr, "Serving Prometheus metrics");
                Ok(())
            },
            Err(BuildError::FailedToSetGlobalRecorder(_)) => {
                tracing::warn!("A metrics recorder is already installed");
                Ok(())
            },
            Err(error) => Err(error.into()),
        }
    }

    /// Scrape address
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Whether this server installed the recorder
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }
}

fn describe_all() {
    for &(name, help) in COUNTERS {
        describe_counter!(name, help);
    }
    for &(name, help) in HISTOGRAMS {
        describe_histogram!(name, help);
    }
}

/// Store-side measurements
pub struct StoreMetrics;

impl StoreMetrics {
    /// One reducer run and the number of effects it returned
    pub fn record_action(duration: Duration, effect_count: usize) {
        counter!("store.commands.total").increment(1);
        histogram!("store.reducer.duration_seconds").record(duration.as_secs_f64());
        #[allow(clippy::cast_precision_loss)]
        histogram!("store.effects.count").record(effect_count as f64);
    }

    /// One effect started
    pub fn record_effect(kind: &'static str) {
        counter!("store.effects.executed", "type" => kind).increment(1);
    }

    /// A cancel that aborted `aborted` tasks
    pub fn record_cancel(aborted: usize) {
        counter!("store.effects.cancelled").increment(aborted as u64);
    }
}

/// Backend request measurements, recorded by request effects
pub struct RequestMetrics;

impl RequestMetrics {
    /// One settled request
    pub fn record(domain: &'static str, operation: &'static str, duration: Duration, ok: bool) {
        counter!("api.requests.total", "domain" => domain, "operation" => operation).increment(1);
        histogram!("api.request.duration_seconds", "domain" => domain).record(duration.as_secs_f64());
        if !ok {
            counter!("api.requests.failed", "domain" => domain, "operation" => operation).increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_a_no_op() {
        StoreMetrics::record_action(Duration::from_millis(1), 2);
        StoreMetrics::record_effect("future");
        StoreMetrics::record_cancel(1);
        RequestMetrics::record("customers", "list", Duration::from_millis(3), false);
    }

    #[test]
    fn test_new_server_is_idle() {
        let server = MetricsServer::new(SocketAddr::from(([127, 0, 0, 1], 9090)));
        assert!(!server.is_running());
        assert_eq!(server.addr().port(), 9090);
    }
}
