//! External liveness ping.

use crate::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Sends `GET` requests to an uptime monitor.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    client: reqwest::Client,
    url: String,
}

impl Heartbeat {
    /// Creates a heartbeat pinging `url`.
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!("buzzword/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: url.into(),
        }
    }

    /// Pings once and waits for the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the monitor answers with a
    /// non-success status.
    pub async fn push(&self) -> Result<()> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::operation("heartbeat", e))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::operation("heartbeat", format!("HTTP {status} response")))
        }
    }

    /// Pings in the background; failures are logged only.
    pub fn ping(&self) {
        let heartbeat = self.clone();
        tokio::spawn(async move {
            match heartbeat.push().await {
                Ok(()) => {
                    metrics::counter!("buzzword_heartbeats_total", "status" => "success").increment(1);
                    debug!("Heartbeat sent");
                },
                Err(e) => {
                    metrics::counter!("buzzword_heartbeats_total", "status" => "failed").increment(1);
                    warn!(error = %e, "Heartbeat failed");
                },
            }
        });
    }
}
