// Invidious mirrors: one GET per instance, first instance that answers wins

use async_trait::async_trait;
use serde::Deserialize;

use crate::resolver::config::ResolverConfig;
use crate::resolver::errors::SourceError;
use crate::resolver::models::{FormatDescriptor, MediaType, VideoId, VideoMetadata};
use crate::resolver::traits::{Lookup, MetadataSource};
use crate::resolver::utils::{self, absolutize, bitrate_label, parse_height};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousVideo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default, deserialize_with = "utils::de_seconds")]
    length_seconds: u64,
    #[serde(default)]
    video_thumbnails: Vec<InvidiousThumbnail>,
    #[serde(default)]
    format_streams: Vec<InvidiousStream>,
    #[serde(default)]
    adaptive_formats: Vec<InvidiousStream>,
}

#[derive(Debug, Deserialize)]
struct InvidiousThumbnail {
    #[serde(default)]
    quality: Option<String>,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousStream {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, deserialize_with = "utils::de_lenient_u64")]
    itag: Option<u64>,
    /// MIME type with codecs, e.g. `audio/mp4; codecs="mp4a.40.2"`
    #[serde(rename = "type", default)]
    mime: Option<String>,
    #[serde(default)]
    quality_label: Option<String>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    container: Option<String>,
    #[serde(default, deserialize_with = "utils::de_lenient_u64")]
    bitrate: Option<u64>,
    #[serde(default, deserialize_with = "utils::de_lenient_u64")]
    clen: Option<u64>,
}

impl InvidiousStream {
    fn media_type(&self) -> Option<MediaType> {
        let mime = self.mime.as_deref().unwrap_or("");
        if mime.starts_with("audio/") {
            Some(MediaType::Audio)
        } else if mime.starts_with("video/") || self.quality_label.is_some() {
            Some(MediaType::Video)
        } else {
            None
        }
    }

    /// "video/webm; codecs=..." -> "webm"
    fn mime_subtype(&self) -> Option<&str> {
        self.mime
            .as_deref()
            .and_then(|m| m.split(';').next())
            .and_then(|m| m.split('/').nth(1))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn normalize(&self, index: usize, adaptive: bool) -> Option<FormatDescriptor> {
        let media_type = self.media_type()?;
        let format_id = self
            .itag
            .map(|i| i.to_string())
            .unwrap_or_else(|| format!("inv_{}", index));

        let (quality, height, format_note) = match media_type {
            MediaType::Video => {
                let label = self
                    .quality_label
                    .clone()
                    .or_else(|| self.resolution.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                let height = parse_height(&label)
                    .or_else(|| self.size.as_deref().and_then(parse_height));
                let note = if adaptive { "video only" } else { "video+audio" };
                (label, height, Some(note.to_string()))
            }
            MediaType::Audio => {
                let label = self
                    .bitrate
                    .map(bitrate_label)
                    .unwrap_or_else(|| "audio".to_string());
                let note = format!("Audio {}", label);
                (label, None, Some(note))
            }
        };

        let ext = self
            .container
            .clone()
            .or_else(|| {
                self.mime_subtype().map(|s| match (media_type, s) {
                    (MediaType::Audio, "mp4") => "m4a".to_string(),
                    (_, other) => other.to_string(),
                })
            })
            .unwrap_or_else(|| match media_type {
                MediaType::Video => "mp4".to_string(),
                MediaType::Audio => "m4a".to_string(),
            });

        Some(FormatDescriptor {
            format_id,
            quality,
            height,
            ext,
            filesize: self.clen,
            url: self.url.clone().filter(|u| !u.is_empty()),
            media_type,
            format_note,
            placeholder: false,
        })
    }
}

/// Normalize `formatStreams` followed by `adaptiveFormats`.
fn normalize_formats(video: &InvidiousVideo) -> Vec<FormatDescriptor> {
    let muxed = video
        .format_streams
        .iter()
        .map(|s| (s, false));
    let adaptive = video
        .adaptive_formats
        .iter()
        .map(|s| (s, true));

    muxed
        .chain(adaptive)
        .enumerate()
        .filter_map(|(idx, (stream, is_adaptive))| stream.normalize(idx, is_adaptive))
        .collect()
}

/// Largest named thumbnail, made absolute against the instance.
fn pick_thumbnail(instance: &str, thumbnails: &[InvidiousThumbnail], video_id: &VideoId) -> String {
    const PREFERRED: &[&str] = &["maxres", "maxresdefault", "sddefault", "high"];

    PREFERRED
        .iter()
        .find_map(|q| {
            thumbnails
                .iter()
                .find(|t| t.quality.as_deref() == Some(*q))
        })
        .or_else(|| thumbnails.first())
        .map(|t| absolutize(instance, &t.url))
        .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id))
}

/// Invidious mirror source
pub struct InvidiousSource {
    client: reqwest::Client,
    instances: Vec<String>,
}

impl InvidiousSource {
    pub fn new(client: reqwest::Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            instances: config
                .invidious_instances
                .iter()
                .map(|i| i.trim_end_matches('/').to_string())
                .filter(|i| !i.is_empty())
                .collect(),
        }
    }

    /// Single request against one instance, no retry.
    async fn fetch_from(
        &self,
        instance: &str,
        video_id: &VideoId,
    ) -> Result<VideoMetadata, SourceError> {
        let endpoint = format!("{}/api/v1/videos/{}", instance, video_id);
        let response = self.client.get(&endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        let video: InvidiousVideo = response.json().await?;
        let title = video
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(SourceError::Incomplete("title"))?;

        Ok(VideoMetadata {
            id: video_id.to_string(),
            title,
            uploader: video.author.clone().unwrap_or_default(),
            thumbnail: pick_thumbnail(instance, &video.video_thumbnails, video_id),
            duration: video.length_seconds,
            webpage_url: video_id.watch_url(),
            formats: normalize_formats(&video),
        })
    }
}

#[async_trait]
impl MetadataSource for InvidiousSource {
    fn name(&self) -> &'static str {
        "invidious"
    }

    async fn try_resolve(&self, lookup: Lookup<'_>) -> Result<VideoMetadata, SourceError> {
        if self.instances.is_empty() {
            return Err(SourceError::Unconfigured);
        }

        for instance in &self.instances {
            tracing::debug!(instance = %instance, video_id = %lookup.video_id, "trying invidious instance");

            match self.fetch_from(instance, lookup.video_id).await {
                Ok(metadata) => {
                    tracing::debug!(instance = %instance, formats = metadata.formats.len(), "invidious instance answered");
                    return Ok(metadata);
                }
                Err(e) => {
                    tracing::warn!(instance = %instance, error = %e, "invidious instance failed");
                }
            }
        }

        Err(SourceError::Exhausted {
            attempts: self.instances.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InvidiousVideo {
        serde_json::from_value(serde_json::json!({
            "title": "Sample",
            "author": "Channel",
            "lengthSeconds": 212,
            "videoThumbnails": [
                {"quality": "default", "url": "/vi/abc/default.jpg", "width": 120, "height": 90},
                {"quality": "high", "url": "/vi/abc/hqdefault.jpg", "width": 480, "height": 360}
            ],
            "formatStreams": [
                {"url": "https://cdn/18", "itag": "18", "type": "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"",
                 "quality": "medium", "container": "mp4", "resolution": "360p", "qualityLabel": "360p", "size": "640x360"}
            ],
            "adaptiveFormats": [
                {"url": "https://cdn/140", "itag": "140", "type": "audio/mp4; codecs=\"mp4a.40.2\"",
                 "bitrate": "129478", "clen": "3433514", "container": "m4a"},
                {"url": "https://cdn/251", "itag": "251", "type": "audio/webm; codecs=\"opus\"",
                 "bitrate": 135000, "clen": "3500000"},
                {"url": "https://cdn/136", "itag": "136", "type": "video/mp4; codecs=\"avc1.4d401f\"",
                 "bitrate": "1500000", "clen": "40000000", "container": "mp4",
                 "qualityLabel": "720p", "resolution": "720p", "size": "1280x720"},
                {"url": "https://cdn/x", "type": "text/vtt"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_normalizes_muxed_and_adaptive() {
        let formats = normalize_formats(&sample());
        assert_eq!(formats.len(), 4);

        let muxed = &formats[0];
        assert_eq!(muxed.format_id, "18");
        assert_eq!(muxed.media_type, MediaType::Video);
        assert_eq!(muxed.quality, "360p");
        assert_eq!(muxed.height, Some(360));
        assert_eq!(muxed.url.as_deref(), Some("https://cdn/18"));

        let hd = formats.iter().find(|f| f.format_id == "136").unwrap();
        assert_eq!(hd.height, Some(720));
        assert_eq!(hd.filesize, Some(40_000_000));
        assert_eq!(hd.format_note.as_deref(), Some("video only"));
    }

    #[test]
    fn test_audio_bitrate_label() {
        let formats = normalize_formats(&sample());
        let aac = formats.iter().find(|f| f.format_id == "140").unwrap();
        assert_eq!(aac.media_type, MediaType::Audio);
        assert_eq!(aac.quality, "129k");
        assert_eq!(aac.ext, "m4a");
        assert_eq!(aac.height, None);

        let opus = formats.iter().find(|f| f.format_id == "251").unwrap();
        assert_eq!(opus.quality, "135k");
        assert_eq!(opus.ext, "webm");
    }

    #[test]
    fn test_thumbnail_prefers_large_and_absolutizes() {
        let video = sample();
        let id = VideoId::new("abc");
        assert_eq!(
            pick_thumbnail("https://inv.example", &video.video_thumbnails, &id),
            "https://inv.example/vi/abc/hqdefault.jpg"
        );
        assert_eq!(
            pick_thumbnail("https://inv.example", &[], &id),
            "https://i.ytimg.com/vi/abc/hqdefault.jpg"
        );
    }
}
