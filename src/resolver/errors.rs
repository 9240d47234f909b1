// Error types for metadata sources, the resolution chain and the download trigger

use serde::Serialize;
use thiserror::Error;

/// Failure of a single metadata source. Always swallowed by the chain,
/// which logs it and advances to the next source.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SourceError {
    /// Source has nothing to talk to (e.g. no backend URL configured)
    #[error("source is not configured")]
    Unconfigured,

    /// Remote answered with a non-success HTTP status
    #[error("HTTP status {status}")]
    Http { status: u16 },

    /// Connection refused, DNS failure, TLS error, ...
    #[error("network error: {0}")]
    Network(String),

    /// Request did not finish in time
    #[error("request timed out")]
    Timeout,

    /// Body could not be decoded into the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Body decoded, but a required field was missing
    #[error("response is missing {0}")]
    Incomplete(&'static str),

    /// Backend answered but reported `success: false`
    #[error("rejected: {0}")]
    Rejected(String),

    /// Every mirror or proxy behind this source failed
    #[error("all {attempts} endpoints failed")]
    Exhausted { attempts: usize },
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// One failed step of the chain, kept for the exhaustion report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: &'static str,
    pub error: SourceError,
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// Failure of a download sink (file save or opening an external page)
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("download request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download returned HTTP status {0}")]
    Status(u16),

    #[error("could not open {url}: {reason}")]
    Open { url: String, reason: String },

    #[error("no download directory available")]
    NoDownloadDir,
}

/// Caller-facing error of the resolver
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No video id could be extracted from the input
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    /// Every source of the chain failed
    #[error("Could not resolve video metadata: all sources failed ({})", format_attempts(.attempts))]
    AllSourcesExhausted { attempts: Vec<SourceFailure> },

    /// No descriptor carried a real URL; reported alongside a `false`
    /// download result, never raised by the trigger itself
    #[error("No direct download URL for video {video_id}")]
    DownloadUnresolvable { video_id: String },

    /// HTTP client could not be built from the configuration
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Opening the redirect service failed as well
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl ResolveError {
    /// Stable machine-readable kind, used by [`ResolutionResult`](super::models::ResolutionResult).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::AllSourcesExhausted { .. } => "all_sources_exhausted",
            Self::DownloadUnresolvable { .. } => "download_unresolvable",
            Self::Client(_) => "client",
            Self::Sink(_) => "sink",
        }
    }
}

fn format_attempts(attempts: &[SourceFailure]) -> String {
    if attempts.is_empty() {
        return "no sources configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
