//! Word-cloud rendering collaborator.
//!
//! Rendering and image hosting live outside the bot. [`HttpImageRenderer`]
//! posts the phrase counts as JSON to a rendering service and expects the
//! hosted image URL back:
//!
//! ```text
//! POST <endpoint>   {"words": {"猫": 5, "犬": 4}}
//! 200 OK            {"url": "https://image.example/abc.png"}
//! ```

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Renders phrase counts to a hosted image.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Renders `counts` and returns the image URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RenderFailed`] if rendering or upload fails.
    async fn render(&self, counts: &BTreeMap<String, usize>) -> Result<String>;
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    words: &'a BTreeMap<String, usize>,
}

#[derive(Deserialize)]
struct RenderResponse {
    url: String,
}

/// Renderer backed by an HTTP rendering service.
#[derive(Debug, Clone)]
pub struct HttpImageRenderer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpImageRenderer {
    /// Creates a renderer posting to `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!("buzzword/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ImageRenderer for HttpImageRenderer {
    async fn render(&self, counts: &BTreeMap<String, usize>) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RenderRequest { words: counts })
            .send()
            .await
            .map_err(|e| Error::RenderFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RenderFailed(format!("HTTP {status} response")));
        }

        let body: RenderResponse = response
            .json()
            .await
            .map_err(|e| Error::RenderFailed(format!("malformed response: {e}")))?;
        if body.url.is_empty() {
            return Err(Error::RenderFailed("empty image url".to_string()));
        }
        Ok(body.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let counts = BTreeMap::from([("犬".to_string(), 4), ("猫".to_string(), 5)]);
        let body = serde_json::to_string(&RenderRequest { words: &counts }).expect("json");
        assert_eq!(body, r#"{"words":{"犬":4,"猫":5}}"#);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_render_failure() {
        let renderer = HttpImageRenderer::new("http://127.0.0.1:1/render", Duration::from_secs(2));
        let result = renderer.render(&BTreeMap::new()).await;
        assert!(matches!(result, Err(Error::RenderFailed(_))));
    }
}
