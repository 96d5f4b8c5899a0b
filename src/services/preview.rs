//! Link previews
//!
//! Proxies a page URL to an external metadata/screenshot service
//! (microlink-compatible response shape). The lookup is bounded by a short
//! timeout and never fails the request: on any upstream problem the caller
//! gets a preview with empty fields.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{ApiError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkPreview {
    pub title: String,
    pub description: String,
    pub image: String,
    pub screenshot: String,
}

#[derive(Deserialize)]
struct UpstreamEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: Option<UpstreamData>,
}

#[derive(Deserialize, Default)]
struct UpstreamData {
    title: Option<String>,
    description: Option<String>,
    image: Option<UpstreamAsset>,
    screenshot: Option<UpstreamAsset>,
}

#[derive(Deserialize)]
struct UpstreamAsset {
    url: Option<String>,
}

fn asset_url(asset: Option<UpstreamAsset>) -> String {
    asset.and_then(|a| a.url).unwrap_or_default()
}

impl From<UpstreamData> for LinkPreview {
    fn from(data: UpstreamData) -> Self {
        Self {
            title: data.title.unwrap_or_default(),
            description: data.description.unwrap_or_default(),
            image: asset_url(data.image),
            screenshot: asset_url(data.screenshot),
        }
    }
}

/// Reject anything that is not an absolute http(s) URL
pub fn validate_target(url: &str) -> Result<&str> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| ApiError::BadRequest("url must start with http:// or https://".into()))?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(ApiError::BadRequest("url has no host".into()));
    }
    Ok(url)
}

pub struct PreviewClient {
    http: reqwest::Client,
    service_url: String,
    timeout: Duration,
}

impl PreviewClient {
    pub fn new(http: reqwest::Client, service_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            service_url: service_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn lookup_url(&self, target: &str) -> String {
        format!(
            "{}/?url={}&screenshot=true",
            self.service_url,
            urlencoding::encode(target)
        )
    }

    async fn try_fetch(&self, target: &str) -> Result<LinkPreview> {
        let response = self
            .http
            .get(self.lookup_url(target))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "Preview service returned {}",
                response.status()
            )));
        }

        let envelope: UpstreamEnvelope = response.json().await?;
        if envelope.status != "success" {
            return Err(ApiError::Upstream(format!(
                "Preview service status '{}'",
                envelope.status
            )));
        }

        Ok(envelope.data.unwrap_or_default().into())
    }

    /// Fetch a preview, degrading to empty fields on any upstream failure
    pub async fn fetch(&self, target: &str) -> LinkPreview {
        match self.try_fetch(target).await {
            Ok(preview) => {
                debug!(url = target, "Link preview fetched");
                preview
            }
            Err(e) => {
                warn!(url = target, error = %e, "Link preview unavailable, returning empty preview");
                LinkPreview::default()
            }
        }
    }
}
