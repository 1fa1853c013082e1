//! Prometheus metrics.

use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Metrics configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsConfig {
    /// Address of the scrape listener; metrics are disabled when `None`.
    pub listen_addr: Option<SocketAddr>,
}

impl MetricsConfig {
    /// Builds metrics configuration from `BUZZWORD_METRICS_PORT`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds metrics configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let listen_addr = lookup("BUZZWORD_METRICS_PORT")
            .and_then(|value| value.trim().parse::<u16>().ok())
            .map(|port| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
        Self { listen_addr }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime. Without a listen address
/// the `metrics` macros stay no-ops.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or a recorder is already installed.
pub fn install_prometheus(config: &MetricsConfig) -> Result<bool> {
    let Some(addr) = config.listen_addr else {
        return Ok(false);
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Error::operation("metrics_exporter_install", e))?;
    tracing::info!(addr = %addr, "Prometheus exporter listening");
    Ok(true)
}
