// Synthetic format catalog for sources that cannot supply stream URLs
//
// Entries are display-only: their URL is the watch page and they are
// flagged `placeholder`, so the download trigger never saves them.

use super::models::{FormatDescriptor, MediaType};

const MB: u64 = 1024 * 1024;

// (label, height, note, approximate size)
const VIDEO_CATALOG: &[(&str, u32, &str, u64)] = &[
    ("144p", 144, "Tiny", 5 * MB),
    ("360p", 360, "Low", 15 * MB),
    ("480p", 480, "Good", 30 * MB),
    ("720p", 720, "HD", 70 * MB),
    ("1080p", 1080, "Full HD", 150 * MB),
];

// (label, note, approximate size)
const AUDIO_CATALOG: &[(&str, &str, u64)] = &[
    ("128k", "Audio 128k", 4 * MB),
    ("320k", "Audio 320k", 10 * MB),
];

/// Number of descriptors [`synthetic_formats`] always returns
pub const SYNTHETIC_FORMAT_COUNT: usize = VIDEO_CATALOG.len() + AUDIO_CATALOG.len();

/// Fixed catalog of plausible renditions pointing at `watch_url`.
pub fn synthetic_formats(watch_url: &str) -> Vec<FormatDescriptor> {
    let video = VIDEO_CATALOG
        .iter()
        .map(|&(label, height, note, size)| (label, Some(height), "mp4", note, size, MediaType::Video));
    let audio = AUDIO_CATALOG
        .iter()
        .map(|&(label, note, size)| (label, None, "m4a", note, size, MediaType::Audio));

    video
        .chain(audio)
        .enumerate()
        .map(|(idx, (label, height, ext, note, size, media_type))| FormatDescriptor {
            format_id: format!("mock_{}", idx),
            quality: label.to_string(),
            height,
            ext: ext.to_string(),
            filesize: Some(size),
            url: Some(watch_url.to_string()),
            media_type,
            format_note: Some(note.to_string()),
            placeholder: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCH: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn test_catalog_has_five_video_and_two_audio() {
        let formats = synthetic_formats(WATCH);
        assert_eq!(formats.len(), 7);
        assert_eq!(SYNTHETIC_FORMAT_COUNT, 7);

        let video: Vec<_> = formats.iter().filter(|f| f.media_type == MediaType::Video).collect();
        let audio: Vec<_> = formats.iter().filter(|f| f.media_type == MediaType::Audio).collect();
        assert_eq!(video.len(), 5);
        assert_eq!(audio.len(), 2);
    }

    #[test]
    fn test_type_tagging_is_consistent() {
        for f in synthetic_formats(WATCH) {
            match f.media_type {
                MediaType::Video => {
                    assert!(f.height.is_some());
                    assert_eq!(f.ext, "mp4");
                }
                MediaType::Audio => {
                    assert!(f.height.is_none());
                    assert_eq!(f.ext, "m4a");
                }
            }
        }
    }

    #[test]
    fn test_entries_are_placeholders() {
        let formats = synthetic_formats(WATCH);
        assert!(formats.iter().all(|f| f.placeholder));
        assert!(formats.iter().all(|f| f.url.as_deref() == Some(WATCH)));
        assert!(formats.iter().all(|f| f.direct_url().is_none()));
        assert_eq!(formats[0].format_id, "mock_0");
        assert_eq!(formats[6].format_id, "mock_6");
    }
}
