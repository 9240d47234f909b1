// Watch-page scrape through rotating CORS proxies
//
// The proxy position lives in a `ProxyCursor` owned by the caller, so
// concurrent lookups never share rotation state. Every failed fetch
// advances the cursor by one; a lookup gives up after twice the number
// of configured proxies.

use async_trait::async_trait;
use regex::Regex;

use crate::resolver::config::ResolverConfig;
use crate::resolver::errors::SourceError;
use crate::resolver::models::{VideoId, VideoMetadata};
use crate::resolver::synthetic::synthetic_formats;
use crate::resolver::traits::{Lookup, MetadataSource};

lazy_static::lazy_static! {
    static ref TITLE_TAG: Regex = Regex::new(r"(?is)<title[^>]*>([^<]+)</title>").unwrap();
    static ref META_TITLE: Regex =
        Regex::new(r#"(?i)<meta\s+(?:name|property)="(?:og:)?title"\s+content="([^"]*)""#).unwrap();
    static ref AUTHOR: Regex = Regex::new(r#""author"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap();
    static ref LENGTH_SECONDS: Regex = Regex::new(r#""lengthSeconds"\s*:\s*"(\d+)""#).unwrap();
}

/// Position in the proxy rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyCursor {
    position: usize,
}

impl ProxyCursor {
    pub fn new(start: usize) -> Self {
        Self { position: start }
    }

    /// Total number of advances since the cursor was created at 0.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Index into a proxy list of length `len`.
    pub fn index(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.position % len
        }
    }

    pub fn current<'a>(&self, proxies: &'a [String]) -> Option<&'a str> {
        proxies.get(self.index(proxies.len())).map(String::as_str)
    }

    pub fn advance(&mut self) {
        self.position = self.position.wrapping_add(1);
    }
}

/// Fields recovered from a watch page; each one may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedPage {
    pub title: Option<String>,
    pub author: Option<String>,
    pub length_seconds: Option<u64>,
}

impl ScrapedPage {
    pub fn parse(html: &str) -> Self {
        Self {
            title: parse_title(html),
            author: parse_author(html),
            length_seconds: LENGTH_SECONDS
                .captures(html)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok()),
        }
    }

    /// Consent walls and error pages carry none of the fields.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none()
    }

    fn into_metadata(self, video_id: &VideoId, watch_url: &str) -> VideoMetadata {
        VideoMetadata {
            id: video_id.to_string(),
            title: self.title.unwrap_or_else(|| "Unknown Title".to_string()),
            uploader: self.author.unwrap_or_else(|| "Unknown Channel".to_string()),
            thumbnail: format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", video_id),
            duration: self.length_seconds.unwrap_or(0),
            webpage_url: watch_url.to_string(),
            formats: synthetic_formats(watch_url),
        }
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn parse_title(html: &str) -> Option<String> {
    let clean = |raw: &str| {
        let decoded = decode_entities(raw.trim());
        let title = decoded.trim_end_matches(" - YouTube").trim().to_string();
        // bare "YouTube" is the consent / error page title
        (!title.is_empty() && title != "YouTube").then_some(title)
    };

    TITLE_TAG
        .captures(html)
        .and_then(|c| c.get(1))
        .and_then(|m| clean(m.as_str()))
        .or_else(|| {
            META_TITLE
                .captures(html)
                .and_then(|c| c.get(1))
                .and_then(|m| clean(m.as_str()))
        })
}

fn parse_author(html: &str) -> Option<String> {
    let raw = AUTHOR.captures(html)?.get(1)?.as_str();
    // JSON string escapes (&, \", ...)
    serde_json::from_str::<String>(&format!("\"{}\"", raw))
        .ok()
        .or_else(|| Some(raw.to_string()))
        .filter(|a| !a.trim().is_empty())
}

/// CORS-proxy scrape source
pub struct ScrapeSource {
    client: reqwest::Client,
    proxies: Vec<String>,
    watch_base: String,
}

impl ScrapeSource {
    pub fn new(client: reqwest::Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            proxies: config.cors_proxies.clone(),
            watch_base: config.watch_base.trim_end_matches('/').to_string(),
        }
    }

    /// Upper bound on fetch attempts for one lookup
    pub fn max_attempts(&self) -> usize {
        self.proxies.len() * 2
    }

    async fn fetch_page(&self, target: &str) -> Result<ScrapedPage, SourceError> {
        let response = self.client.get(target).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        let page = ScrapedPage::parse(&html);
        if page.is_empty() {
            return Err(SourceError::Incomplete("title and author"));
        }
        Ok(page)
    }

    /// Scrape the watch page, rotating `cursor` on each failure.
    pub async fn scrape(
        &self,
        video_id: &VideoId,
        cursor: &mut ProxyCursor,
    ) -> Result<VideoMetadata, SourceError> {
        if self.proxies.is_empty() {
            return Err(SourceError::Unconfigured);
        }

        let watch_url = format!("{}/watch?v={}", self.watch_base, video_id);
        let encoded = urlencoding::encode(&watch_url);

        for attempt in 0..self.max_attempts() {
            let Some(proxy) = cursor.current(&self.proxies) else {
                break;
            };
            let target = format!("{}{}", proxy, encoded);
            tracing::debug!(attempt, proxy, "scraping watch page through proxy");

            match self.fetch_page(&target).await {
                Ok(page) => return Ok(page.into_metadata(video_id, &watch_url)),
                Err(e) => {
                    tracing::warn!(proxy, error = %e, "scrape through proxy failed, rotating");
                    cursor.advance();
                }
            }
        }

        Err(SourceError::Exhausted {
            attempts: self.max_attempts(),
        })
    }
}

#[async_trait]
impl MetadataSource for ScrapeSource {
    fn name(&self) -> &'static str {
        "scrape"
    }

    async fn try_resolve(&self, lookup: Lookup<'_>) -> Result<VideoMetadata, SourceError> {
        let mut cursor = ProxyCursor::default();
        self.scrape(lookup.video_id, &mut cursor).await
    }
}
