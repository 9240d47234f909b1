// FormatSelector - picks the descriptor a download request refers to
//
// Matching is by substring on the quality label ("720" matches "720p",
// "128" matches "128k"), restricted to the requested media type.
// Descriptors with a direct URL win over placeholders.

use super::models::{FormatDescriptor, MediaType};

/// Format selector for download requests
pub struct FormatSelector;

impl FormatSelector {
    /// Select the descriptor to download.
    ///
    /// 1. first descriptor of `media_type` whose label contains `quality`
    ///    and which has a direct URL
    /// 2. otherwise the first descriptor of `media_type` with any direct URL
    ///
    /// `None` means nothing of that type can be saved directly.
    pub fn select<'a>(
        formats: &'a [FormatDescriptor],
        quality: &str,
        media_type: MediaType,
    ) -> Option<&'a FormatDescriptor> {
        let wanted = quality.trim().to_lowercase();
        let mut of_type = formats
            .iter()
            .filter(|f| f.media_type == media_type && f.direct_url().is_some());

        if !wanted.is_empty() {
            if let Some(hit) = of_type
                .clone()
                .find(|f| f.quality.to_lowercase().contains(&wanted))
            {
                return Some(hit);
            }
        }

        of_type.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_format(quality: &str, media_type: MediaType, url: Option<&str>) -> FormatDescriptor {
        FormatDescriptor {
            format_id: quality.to_string(),
            quality: quality.to_string(),
            height: crate::resolver::utils::parse_height(quality),
            ext: if media_type == MediaType::Video { "mp4" } else { "m4a" }.to_string(),
            filesize: None,
            url: url.map(str::to_string),
            media_type,
            format_note: None,
            placeholder: false,
        }
    }

    #[test]
    fn test_substring_match() {
        let formats = vec![
            make_format("360p", MediaType::Video, Some("https://cdn/360")),
            make_format("720p", MediaType::Video, Some("https://cdn/720")),
            make_format("128k", MediaType::Audio, Some("https://cdn/a128")),
        ];

        let picked = FormatSelector::select(&formats, "720", MediaType::Video).unwrap();
        assert_eq!(picked.quality, "720p");

        let audio = FormatSelector::select(&formats, "128", MediaType::Audio).unwrap();
        assert_eq!(audio.format_id, "128k");
    }

    #[test]
    fn test_falls_back_to_first_of_type_with_url() {
        let formats = vec![
            make_format("128k", MediaType::Audio, Some("https://cdn/a128")),
            make_format("360p", MediaType::Video, None),
            make_format("480p", MediaType::Video, Some("https://cdn/480")),
        ];

        let picked = FormatSelector::select(&formats, "1080", MediaType::Video).unwrap();
        assert_eq!(picked.quality, "480p");
    }

    #[test]
    fn test_matching_label_without_url_is_skipped() {
        let formats = vec![
            make_format("720p", MediaType::Video, Some("  ")),
            make_format("360p", MediaType::Video, Some("https://cdn/360")),
        ];

        let picked = FormatSelector::select(&formats, "720", MediaType::Video).unwrap();
        assert_eq!(picked.quality, "360p");
    }

    #[test]
    fn test_nothing_downloadable() {
        let mut placeholder = make_format("720p", MediaType::Video, Some("https://www.youtube.com/watch?v=x"));
        placeholder.placeholder = true;
        let formats = vec![placeholder, make_format("128k", MediaType::Audio, Some("https://cdn/a"))];

        assert!(FormatSelector::select(&formats, "720", MediaType::Video).is_none());
    }
}
