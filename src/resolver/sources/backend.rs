// Backend server: health probe, then authoritative /api/info

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::resolver::config::{BackendMethod, ResolverConfig};
use crate::resolver::errors::SourceError;
use crate::resolver::models::{ResolutionMode, VideoMetadata};
use crate::resolver::traits::{Lookup, MetadataSource};

/// Optional feature-complete backend server. Authoritative when healthy
/// and answering `success: true`.
pub struct BackendSource {
    client: reqwest::Client,
    base_url: Option<String>,
    method: BackendMethod,
    health_timeout: Duration,
}

impl BackendSource {
    pub fn new(client: reqwest::Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            base_url: config
                .backend_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            method: config.backend_method,
            health_timeout: config.health_timeout,
        }
    }

    /// Probe `{base}/api/health`. Every failure reads as "unavailable".
    pub async fn is_available(&self) -> bool {
        let Some(base) = self.base_url.as_deref() else {
            return false;
        };

        let probe = self
            .client
            .get(format!("{}/api/health", base))
            .header(CACHE_CONTROL, "no-cache")
            .timeout(self.health_timeout)
            .send()
            .await;

        match probe {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(backend = base, error = %e, "backend health probe failed");
                false
            }
        }
    }

    async fn request_info(&self, base: &str, url: &str) -> Result<Value, SourceError> {
        let endpoint = format!("{}/api/info", base);
        let request = match self.method {
            BackendMethod::Post => self.client.post(&endpoint).json(&json!({ "url": url })),
            BackendMethod::Get => self.client.get(&endpoint).query(&[("url", url)]),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Accepts `{success, data: {...}}` as well as the flattened `{success, ...}`.
fn parse_backend_payload(body: Value, fallback_id: &str) -> Result<VideoMetadata, SourceError> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        let reason = ["detail", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .unwrap_or("backend reported success=false");
        return Err(SourceError::Rejected(reason.to_string()));
    }

    let payload = match body.get("data") {
        Some(data) if data.is_object() => data.clone(),
        _ => body,
    };

    let mut metadata = VideoMetadata::deserialize(payload)?;
    if metadata.id.is_empty() {
        metadata.id = fallback_id.to_string();
    }
    for (index, format) in metadata.formats.iter_mut().enumerate() {
        if format.format_id.is_empty() {
            format.format_id = format!("backend_{}", index);
        }
    }
    Ok(metadata)
}

#[async_trait]
impl MetadataSource for BackendSource {
    fn name(&self) -> &'static str {
        "backend"
    }

    fn mode(&self) -> ResolutionMode {
        ResolutionMode::Backend
    }

    async fn try_resolve(&self, lookup: Lookup<'_>) -> Result<VideoMetadata, SourceError> {
        let base = self.base_url.as_deref().ok_or(SourceError::Unconfigured)?;

        if !self.is_available().await {
            return Err(SourceError::Network(format!("backend at {} is not healthy", base)));
        }

        let body = self.request_info(base, lookup.url).await?;
        parse_backend_payload(body, lookup.video_id.as_str())
    }
}
