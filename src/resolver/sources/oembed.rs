// oEmbed: title, uploader and thumbnail only; formats are synthetic

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::resolver::config::ResolverConfig;
use crate::resolver::errors::SourceError;
use crate::resolver::models::VideoMetadata;
use crate::resolver::synthetic::synthetic_formats;
use crate::resolver::traits::{Lookup, MetadataSource};
use crate::resolver::utils;

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

pub struct OEmbedSource {
    client: reqwest::Client,
    endpoint: String,
    noembed_endpoint: Option<String>,
    watch_base: String,
}

impl OEmbedSource {
    pub fn new(client: reqwest::Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            endpoint: config.oembed_endpoint.clone(),
            noembed_endpoint: config.noembed_endpoint.clone(),
            watch_base: config.watch_base.trim_end_matches('/').to_string(),
        }
    }

    /// Best-effort duration from noembed; 0 on any failure.
    async fn noembed_duration(&self, watch_url: &str) -> u64 {
        let Some(endpoint) = self.noembed_endpoint.as_deref() else {
            return 0;
        };

        let response = match self.client.get(endpoint).query(&[("url", watch_url)]).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(status = r.status().as_u16(), "noembed returned non-success status");
                return 0;
            }
            Err(e) => {
                tracing::debug!(error = %e, "noembed request failed");
                return 0;
            }
        };

        match response.json::<Value>().await {
            Ok(body) => body
                .get("duration")
                .cloned()
                .and_then(|d| utils::de_lenient_u64(d).ok().flatten())
                .unwrap_or(0),
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl MetadataSource for OEmbedSource {
    fn name(&self) -> &'static str {
        "oembed"
    }

    async fn try_resolve(&self, lookup: Lookup<'_>) -> Result<VideoMetadata, SourceError> {
        let watch_url = format!("{}/watch?v={}", self.watch_base, lookup.video_id);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        let oembed: OEmbedResponse = response.json().await?;
        let title = oembed
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(SourceError::Incomplete("title"))?;

        let duration = self.noembed_duration(&watch_url).await;

        Ok(VideoMetadata {
            id: lookup.video_id.to_string(),
            title,
            uploader: oembed.author_name.unwrap_or_default(),
            thumbnail: oembed.thumbnail_url.unwrap_or_else(|| {
                format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", lookup.video_id)
            }),
            duration,
            formats: synthetic_formats(&watch_url),
            webpage_url: watch_url,
        })
    }
}
