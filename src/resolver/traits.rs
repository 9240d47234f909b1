// Metadata source and download sink trait definitions

use async_trait::async_trait;
use std::path::PathBuf;

use super::errors::{SinkError, SourceError};
use super::models::{ResolutionMode, VideoId, VideoMetadata};

/// What a source gets to work with for one lookup
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    /// URL exactly as the caller supplied it
    pub url: &'a str,
    pub video_id: &'a VideoId,
}

/// One provider in the resolution chain
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Name of the source (for logging and failure reports)
    fn name(&self) -> &'static str;

    /// Mode reported when this source wins
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::Fallback
    }

    /// Produce normalized metadata or explain why not.
    async fn try_resolve(&self, lookup: Lookup<'_>) -> Result<VideoMetadata, SourceError>;
}

/// Side effects of the download trigger
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Save the resource at `url` as `filename`.
    async fn save(&self, url: &str, filename: &str) -> Result<PathBuf, SinkError>;

    /// Open `url` in an external browser tab.
    fn open_external(&self, url: &str) -> Result<(), SinkError>;
}
