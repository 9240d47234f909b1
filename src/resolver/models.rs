// Common data models for metadata resolution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ResolveError;
use super::utils;

/// Video identifier captured from a YouTube URL. Not validated beyond the
/// capture itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page for this id.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of rendition a format descriptor points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Video,
    Audio,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            other => Err(format!("unknown media type: {}", other)),
        }
    }
}

/// One downloadable rendition of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Source-specific id (itag, yt-dlp format id, `mock_N`)
    #[serde(default, deserialize_with = "utils::de_string_or_default")]
    pub format_id: String,
    /// Quality label ("720p", "128k")
    #[serde(default, deserialize_with = "utils::de_string_or_default")]
    pub quality: String,
    /// Video height in pixels (video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Container / file extension
    #[serde(default = "default_ext", deserialize_with = "de_ext")]
    pub ext: String,
    /// Approximate size in bytes
    #[serde(default, deserialize_with = "utils::de_lenient_u64")]
    pub filesize: Option<u64>,
    /// Direct media URL, or a placeholder page for synthetic entries
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    /// Human note shown next to the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_note: Option<String>,
    /// Synthetic entry whose URL is not downloadable
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

fn default_ext() -> String {
    "mp4".to_string()
}

fn de_ext<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(default_ext))
}

impl FormatDescriptor {
    /// URL usable for a direct file save, if any.
    pub fn direct_url(&self) -> Option<&str> {
        if self.placeholder {
            return None;
        }
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Size for display ("15 MB", "1.2 GB")
    pub fn size_label(&self) -> Option<String> {
        self.filesize.map(|b| {
            let mb = b as f64 / 1_048_576.0;
            if mb >= 1024.0 {
                format!("{:.1} GB", mb / 1024.0)
            } else {
                format!("{:.0} MB", mb)
            }
        })
    }
}

/// Normalized metadata of one video, built fresh per lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default, deserialize_with = "utils::de_string_or_default")]
    pub id: String,
    #[serde(default, deserialize_with = "utils::de_string_or_default")]
    pub title: String,
    #[serde(default, deserialize_with = "utils::de_string_or_default")]
    pub uploader: String,
    #[serde(default, deserialize_with = "utils::de_string_or_default")]
    pub thumbnail: String,
    /// Duration in seconds; 0 when unknown
    #[serde(default, deserialize_with = "utils::de_seconds")]
    pub duration: u64,
    #[serde(default, deserialize_with = "utils::de_string_or_default")]
    pub webpage_url: String,
    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
}

impl VideoMetadata {
    /// Formats of one media type, in source order.
    pub fn formats_of(&self, media_type: MediaType) -> impl Iterator<Item = &FormatDescriptor> {
        self.formats
            .iter()
            .filter(move |f| f.media_type == media_type)
    }

    /// Whether any descriptor can be saved directly.
    pub fn has_direct_urls(&self) -> bool {
        self.formats.iter().any(|f| f.direct_url().is_some())
    }

    /// "m:ss" or "h:mm:ss"
    pub fn duration_label(&self) -> String {
        let h = self.duration / 3600;
        let m = (self.duration % 3600) / 60;
        let s = self.duration % 60;
        if h > 0 {
            format!("{}:{:02}:{:02}", h, m, s)
        } else {
            format!("{}:{:02}", m, s)
        }
    }
}

/// Which path produced the metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Feature-complete backend server
    Backend,
    /// Client-side public services
    Fallback,
}

/// Successful outcome of the chain
#[derive(Debug, Clone)]
pub struct Resolution {
    pub mode: ResolutionMode,
    /// Name of the source that answered
    pub source: &'static str,
    pub metadata: VideoMetadata,
}

/// Error body of a serialized result
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionErrorBody {
    pub kind: &'static str,
    pub message: String,
}

/// `{success, mode, data | error}` shape handed to a UI layer
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResolutionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<VideoMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResolutionErrorBody>,
}

impl From<Result<Resolution, ResolveError>> for ResolutionResult {
    fn from(result: Result<Resolution, ResolveError>) -> Self {
        match result {
            Ok(resolution) => Self {
                success: true,
                mode: Some(resolution.mode),
                data: Some(resolution.metadata),
                error: None,
            },
            Err(e) => Self {
                success: false,
                mode: None,
                data: None,
                error: Some(ResolutionErrorBody {
                    kind: e.kind(),
                    message: e.to_string(),
                }),
            },
        }
    }
}
