//! Serverless YouTube metadata resolution.
//!
//! A [`ResolutionChain`] tries, in order: an optional backend server,
//! Invidious mirrors, oEmbed and a CORS-proxy scrape of the watch page.
//! The first source that yields metadata wins. [`DownloadTrigger`] then
//! saves a chosen format, or opens a redirect service when no direct URL
//! is available.

pub mod resolver;

pub use resolver::{
    extract_video_id, sanitize_filename, synthetic_formats, BackendMethod, DownloadSink,
    DownloadTrigger, FormatDescriptor, FormatSelector, Lookup, MediaType, MetadataSource,
    Resolution, ResolutionChain, ResolutionMode, ResolutionResult, ResolveError, ResolverConfig,
    SinkError, SourceError, SourceFailure, SystemSink, VideoId, VideoMetadata,
};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG` (default
/// `tubenova_fallback=info`). Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tubenova_fallback=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
