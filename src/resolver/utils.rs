// Helper functions shared by sources and the download trigger

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::config::ResolverConfig;
use super::errors::ResolveError;
use super::models::VideoId;

lazy_static::lazy_static! {
    // Tried in order: watch, short link, embed, shorts
    static ref VIDEO_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"youtube\.com/watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"youtu\.be/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"youtube(?:-nocookie)?\.com/embed/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"youtube\.com/shorts/([A-Za-z0-9_-]+)").unwrap(),
    ];
    static ref ILLEGAL_FILENAME_CHARS: Regex = Regex::new(r"[^\w\s\-()\[\]]").unwrap();
    static ref LEADING_HEIGHT: Regex = Regex::new(r"^(\d{2,4})p").unwrap();
    static ref SIZE_HEIGHT: Regex = Regex::new(r"^\d+x(\d+)$").unwrap();
}

/// Longest sanitized title kept in a filename
pub const MAX_FILENAME_LEN: usize = 80;

/// Extract the video id from a watch, short, embed or shorts URL.
/// Returns `None` when no pattern matches.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId::new(m.as_str()))
}

/// Like [`extract_video_id`] but fails with `InvalidUrl`.
pub fn require_video_id(url: &str) -> Result<VideoId, ResolveError> {
    extract_video_id(url).ok_or_else(|| ResolveError::InvalidUrl(url.to_string()))
}

/// Replace characters that are unsafe in filenames with `_` and cap the
/// length. Word characters, whitespace, `-`, parentheses and brackets
/// survive.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = ILLEGAL_FILENAME_CHARS.replace_all(name.trim(), "_");
    cleaned.chars().take(MAX_FILENAME_LEN).collect()
}

/// `<sanitized title>.<ext>`, falling back to the id for empty titles.
pub fn build_filename(title: &str, fallback: &str, ext: &str) -> String {
    let mut stem = sanitize_filename(title);
    if stem.trim().is_empty() {
        stem = sanitize_filename(fallback);
    }
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, ext)
    }
}

/// Human bitrate label from a raw bits-per-second value ("128k").
pub fn bitrate_label(bits_per_second: u64) -> String {
    format!("{}k", (bits_per_second as f64 / 1000.0).round() as u64)
}

/// Height from a quality label ("720p60" -> 720) or a "WxH" size string.
pub fn parse_height(label: &str) -> Option<u32> {
    let label = label.trim();
    LEADING_HEIGHT
        .captures(label)
        .or_else(|| SIZE_HEIGHT.captures(label))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Build the shared HTTP client (timeout, user agent, optional proxy).
pub fn build_client(config: &ResolverConfig) -> Result<reqwest::Client, ResolveError> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.as_str());

    if let Some(proxy_url) = config.proxy.as_deref() {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ResolveError::Client(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
        tracing::debug!(proxy = proxy_url, "using proxy for metadata requests");
    }

    builder
        .build()
        .map_err(|e| ResolveError::Client(e.to_string()))
}

/// Join a possibly relative path onto a base URL.
pub fn absolutize(base: &str, path: &str) -> String {
    if path.starts_with("//") {
        format!("https:{}", path)
    } else if path.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), path)
    } else {
        path.to_string()
    }
}

fn value_as_u64(value: &Value) -> Option<u64> {
    let from_f64 = |f: f64| (f.is_finite() && f >= 0.0).then(|| f.round() as u64);
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(from_f64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(from_f64))
        }
        _ => None,
    }
}

/// Number, numeric string or null into `Option<u64>`.
pub fn de_lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_u64))
}

/// Seconds as number, float or string; unknown becomes 0.
pub fn de_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_lenient_u64(deserializer)?.unwrap_or(0))
}

/// String or null into a `String`.
pub fn de_string_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_watch_url() {
        let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_watch_url_with_leading_params() {
        let id = extract_video_id("https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_short_url() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_embed_url() {
        let id = extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_shorts_url() {
        let id = extract_video_id("https://youtube.com/shorts/abcDEF12_-3/").unwrap();
        assert_eq!(id.as_str(), "abcDEF12_-3");
    }

    #[test]
    fn test_unsupported_urls() {
        assert!(extract_video_id("https://vimeo.com/123456").is_none());
        assert!(extract_video_id("https://www.youtube.com/channel/UC123").is_none());
        assert!(extract_video_id("https://www.youtube.com/watch?v=").is_none());
        assert!(extract_video_id("not a url").is_none());
        assert!(matches!(
            require_video_id("https://example.com"),
            Err(ResolveError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b:c?"), "a_b_c_");
        assert_eq!(sanitize_filename("Song (Live) [HD] - 2024"), "Song (Live) [HD] - 2024");
        assert_eq!(sanitize_filename(&"x".repeat(200)).chars().count(), MAX_FILENAME_LEN);
    }

    #[test]
    fn test_build_filename_falls_back_to_id() {
        assert_eq!(build_filename("  ", "dQw4w9WgXcQ", "mp4"), "dQw4w9WgXcQ.mp4");
        assert_eq!(build_filename("Title", "id", ".m4a"), "Title.m4a");
    }

    #[test]
    fn test_bitrate_label_rounds() {
        assert_eq!(bitrate_label(129_478), "129k");
        assert_eq!(bitrate_label(50_500), "51k");
        assert_eq!(bitrate_label(0), "0k");
    }

    #[test]
    fn test_parse_height() {
        assert_eq!(parse_height("720p"), Some(720));
        assert_eq!(parse_height("1080p60"), Some(1080));
        assert_eq!(parse_height("640x360"), Some(360));
        assert_eq!(parse_height("medium"), None);
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(absolutize("https://inv.example/", "/vi/x/hq.jpg"), "https://inv.example/vi/x/hq.jpg");
        assert_eq!(absolutize("https://inv.example", "//img.example/a.jpg"), "https://img.example/a.jpg");
        assert_eq!(absolutize("https://inv.example", "https://other/a.jpg"), "https://other/a.jpg");
    }
}
