// Metadata sources, in default chain order

pub mod backend;
pub mod invidious;
pub mod oembed;
pub mod scrape;

pub use backend::BackendSource;
pub use invidious::InvidiousSource;
pub use oembed::OEmbedSource;
pub use scrape::{ProxyCursor, ScrapeSource, ScrapedPage};
