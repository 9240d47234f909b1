// Download trigger: direct file save when a real URL exists, otherwise a
// third-party redirect service opened in the browser

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::config::ResolverConfig;
use super::errors::{ResolveError, SinkError};
use super::format_selector::FormatSelector;
use super::models::{MediaType, VideoMetadata};
use super::traits::DownloadSink;
use super::utils::build_filename;

/// Saves into a download directory and opens pages in the system browser
pub struct SystemSink {
    client: reqwest::Client,
    dir: Option<PathBuf>,
}

impl SystemSink {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, dir: None }
    }

    /// Save into `dir` instead of the user's download directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    fn target_dir(&self) -> Result<PathBuf, SinkError> {
        self.dir
            .clone()
            .or_else(dirs::download_dir)
            .ok_or(SinkError::NoDownloadDir)
    }
}

#[async_trait]
impl DownloadSink for SystemSink {
    async fn save(&self, url: &str, filename: &str) -> Result<PathBuf, SinkError> {
        let dir = self.target_dir()?;
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(filename);
        let part = dir.join(format!("{}.part", filename));

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }

        // `path` is only touched once the whole body is on disk
        let written = match write_body(response, &part).await {
            Ok(written) => written,
            Err(e) => {
                discard_partial(&part).await;
                return Err(e);
            }
        };
        if let Err(e) = tokio::fs::rename(&part, &path).await {
            discard_partial(&part).await;
            return Err(e.into());
        }

        tracing::info!(path = %path.display(), bytes = written, "saved download");
        Ok(path)
    }

    fn open_external(&self, url: &str) -> Result<(), SinkError> {
        open::that(url).map_err(|e| SinkError::Open {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

async fn write_body(mut response: reqwest::Response, part: &Path) -> Result<u64, SinkError> {
    let mut file = tokio::fs::File::create(part).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

async fn discard_partial(part: &Path) {
    if let Err(e) = tokio::fs::remove_file(part).await {
        tracing::debug!(path = %part.display(), error = %e, "could not remove partial download");
    }
}

/// Turns a quality/type request into a file save or a redirect tab
pub struct DownloadTrigger<S: DownloadSink> {
    sink: S,
    redirect_services: Vec<String>,
    watch_base: String,
}

impl<S: DownloadSink> DownloadTrigger<S> {
    pub fn new(sink: S, config: &ResolverConfig) -> Self {
        Self {
            sink,
            redirect_services: config.redirect_services.clone(),
            watch_base: config.watch_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Redirect page for a video: first service template, or the watch
    /// page when no service is configured.
    pub fn redirect_url(&self, video_id: &str) -> String {
        self.redirect_services
            .first()
            .map(|template| template.replace("{id}", video_id))
            .unwrap_or_else(|| format!("{}/watch?v={}", self.watch_base, video_id))
    }

    /// Save the descriptor matching `quality` and `media_type`.
    ///
    /// Returns `Ok(true)` when a file was saved and `Ok(false)` when no
    /// direct URL could be used and the redirect service was opened
    /// instead. Errors only when opening the redirect page fails too.
    pub async fn trigger(
        &self,
        metadata: &VideoMetadata,
        quality: &str,
        media_type: MediaType,
    ) -> Result<bool, ResolveError> {
        if let Some(format) = FormatSelector::select(&metadata.formats, quality, media_type) {
            if let Some(url) = format.direct_url() {
                let filename = build_filename(&metadata.title, &metadata.id, &format.ext);
                tracing::debug!(format_id = %format.format_id, quality = %format.quality, filename = %filename, "saving format");

                match self.sink.save(url, &filename).await {
                    Ok(_) => return Ok(true),
                    Err(e) => {
                        tracing::warn!(format_id = %format.format_id, error = %e, "direct save failed, using redirect service");
                    }
                }
            }
        }

        let unresolvable = ResolveError::DownloadUnresolvable {
            video_id: metadata.id.clone(),
        };
        let redirect = self.redirect_url(&metadata.id);
        tracing::warn!(
            error = %unresolvable,
            requested = quality,
            media_type = %media_type,
            redirect = %redirect,
            "opening redirect service"
        );

        self.sink.open_external(&redirect)?;
        Ok(false)
    }

    /// Save the thumbnail as `<title>.jpg`. `None` when there is no thumbnail.
    pub async fn save_thumbnail(
        &self,
        metadata: &VideoMetadata,
    ) -> Result<Option<PathBuf>, ResolveError> {
        if metadata.thumbnail.trim().is_empty() {
            return Ok(None);
        }
        let filename = build_filename(&metadata.title, &metadata.id, "jpg");
        let path = self.sink.save(&metadata.thumbnail, &filename).await?;
        Ok(Some(path))
    }
}
