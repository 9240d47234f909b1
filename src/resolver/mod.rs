// Resolver module - metadata resolution chain and download trigger

pub mod config;
pub mod download;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod sources;
pub mod synthetic;
pub mod traits;
pub mod utils;

pub use config::{BackendMethod, ResolverConfig};
pub use download::{DownloadTrigger, SystemSink};
pub use errors::{ResolveError, SinkError, SourceError, SourceFailure};
pub use format_selector::FormatSelector;
pub use models::{
    FormatDescriptor, MediaType, Resolution, ResolutionMode, ResolutionResult, VideoId,
    VideoMetadata,
};
pub use orchestrator::ResolutionChain;
pub use synthetic::synthetic_formats;
pub use traits::{DownloadSink, Lookup, MetadataSource};
pub use utils::{extract_video_id, sanitize_filename};
