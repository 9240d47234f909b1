// Resolution chain: ordered metadata sources, first success wins

use super::config::ResolverConfig;
use super::errors::{ResolveError, SourceFailure};
use super::models::{Resolution, ResolutionResult};
use super::sources::{BackendSource, InvidiousSource, OEmbedSource, ScrapeSource};
use super::traits::{Lookup, MetadataSource};
use super::utils;

/// Ordered list of metadata sources. Each source is awaited to
/// completion before the next one is tried; source failures are logged
/// and swallowed, only total exhaustion reaches the caller.
pub struct ResolutionChain {
    sources: Vec<Box<dyn MetadataSource>>,
}

impl ResolutionChain {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Standard order: backend (if configured), Invidious mirrors, oEmbed,
    /// CORS-proxy scrape (if enabled).
    pub fn standard(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let client = utils::build_client(config)?;
        let mut chain = Self::new();

        if config.backend_url.is_some() {
            chain.add_source(Box::new(BackendSource::new(client.clone(), config)));
        }
        if !config.invidious_instances.is_empty() {
            chain.add_source(Box::new(InvidiousSource::new(client.clone(), config)));
        }
        chain.add_source(Box::new(OEmbedSource::new(client.clone(), config)));
        if config.enable_scrape && !config.cors_proxies.is_empty() {
            chain.add_source(Box::new(ScrapeSource::new(client, config)));
        }

        Ok(chain)
    }

    pub fn add_source(&mut self, source: Box<dyn MetadataSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Box<dyn MetadataSource>) -> Self {
        self.add_source(source);
        self
    }

    /// Source names in the order they are tried.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, url: &str) -> Result<Resolution, ResolveError> {
        let video_id = utils::require_video_id(url)?;
        let lookup = Lookup {
            url,
            video_id: &video_id,
        };
        let mut attempts = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            tracing::debug!(source = source.name(), video_id = %video_id, "trying metadata source");

            match source.try_resolve(lookup).await {
                Ok(metadata) => {
                    let mode = source.mode();
                    tracing::info!(
                        source = source.name(),
                        mode = ?mode,
                        video_id = %video_id,
                        formats = metadata.formats.len(),
                        "resolved video metadata"
                    );
                    return Ok(Resolution {
                        mode,
                        source: source.name(),
                        metadata,
                    });
                }
                Err(error) => {
                    tracing::warn!(source = source.name(), error = %error, "metadata source failed");
                    attempts.push(SourceFailure {
                        source: source.name(),
                        error,
                    });
                }
            }
        }

        tracing::error!(video_id = %video_id, attempts = attempts.len(), "all metadata sources failed");
        Err(ResolveError::AllSourcesExhausted { attempts })
    }

    /// [`resolve`](Self::resolve) folded into the serializable result shape.
    pub async fn resolve_result(&self, url: &str) -> ResolutionResult {
        self.resolve(url).await.into()
    }
}

impl Default for ResolutionChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::errors::SourceError;
    use crate::resolver::models::{ResolutionMode, VideoMetadata};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        mode: ResolutionMode,
        outcome: Result<&'static str, SourceError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MetadataSource for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn mode(&self) -> ResolutionMode {
            self.mode
        }

        async fn try_resolve(&self, lookup: Lookup<'_>) -> Result<VideoMetadata, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map(|title| VideoMetadata {
                id: lookup.video_id.to_string(),
                title: title.to_string(),
                uploader: String::new(),
                thumbnail: String::new(),
                duration: 0,
                webpage_url: lookup.video_id.watch_url(),
                formats: vec![],
            })
        }
    }

    fn scripted(
        name: &'static str,
        outcome: Result<&'static str, SourceError>,
    ) -> (Box<dyn MetadataSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Scripted {
            name,
            mode: ResolutionMode::Fallback,
            outcome,
            calls: calls.clone(),
        };
        (Box::new(source), calls)
    }

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    #[tokio::test]
    async fn test_first_success_stops_the_chain() {
        let (a, a_calls) = scripted("a", Err(SourceError::Timeout));
        let (b, b_calls) = scripted("b", Ok("from b"));
        let (c, c_calls) = scripted("c", Ok("from c"));
        let chain = ResolutionChain::new().with_source(a).with_source(b).with_source(c);

        let resolution = chain.resolve(URL).await.unwrap();
        assert_eq!(resolution.source, "b");
        assert_eq!(resolution.metadata.title, "from b");
        assert_eq!(resolution.mode, ResolutionMode::Fallback);
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_every_source() {
        let (a, _) = scripted("a", Err(SourceError::Http { status: 500 }));
        let (b, _) = scripted("b", Err(SourceError::Incomplete("title")));
        let chain = ResolutionChain::new().with_source(a).with_source(b);

        match chain.resolve(URL).await {
            Err(ResolveError::AllSourcesExhausted { attempts }) => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].source, "a");
                assert_eq!(attempts[1].error, SourceError::Incomplete("title"));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.source)),
        }
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_sources() {
        let (a, a_calls) = scripted("a", Ok("x"));
        let chain = ResolutionChain::new().with_source(a);

        let result = chain.resolve_result("https://vimeo.com/1").await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, "invalid_url");
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_standard_order() {
        let config = ResolverConfig::default().with_backend_url(Some("http://localhost:5000".into()));
        let chain = ResolutionChain::standard(&config).unwrap();
        assert_eq!(chain.source_names(), vec!["backend", "invidious", "oembed", "scrape"]);

        let config = ResolverConfig::default()
            .with_scrape(false)
            .with_invidious_instances(vec![]);
        let chain = ResolutionChain::standard(&config).unwrap();
        assert_eq!(chain.source_names(), vec!["oembed"]);
    }
}
