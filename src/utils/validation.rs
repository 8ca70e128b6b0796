//! URL and input validation utilities

use url::Url;

/// Domains accepted by the interactive session
const YOUTUBE_DOMAINS: [&str; 2] = ["youtube.com", "youtu.be"];

/// Check if the input looks like a YouTube URL.
///
/// Deliberately a case-insensitive substring check; everything stricter is
/// left to the fetch tool, which knows the real set of supported URL shapes.
pub fn is_youtube_url(input: &str) -> bool {
    let lowered = input.to_lowercase();
    YOUTUBE_DOMAINS.iter().any(|domain| lowered.contains(domain))
}

/// Validate that a string parses as a URL at all
pub fn parse_url(input: &str) -> Option<Url> {
    Url::parse(input).ok()
}

/// Extract the video id from the common YouTube URL shapes
pub fn extract_youtube_video_id(url: &str) -> Option<String> {
    let parsed = parse_url(url)?;

    // Handle youtube.com/watch?v=VIDEO_ID
    if let Some(query) = parsed.query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "v" {
                return Some(value.to_string());
            }
        }
    }

    // Handle youtu.be/VIDEO_ID
    if parsed.host_str()? == "youtu.be" {
        let path = parsed.path();
        if path.len() > 1 {
            return Some(path[1..].to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_url_detection() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://m.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!is_youtube_url("https://example.com/video"));
        assert!(!is_youtube_url("https://vimeo.com/12345"));
    }

    #[test]
    fn test_youtube_url_detection_is_case_insensitive() {
        assert!(is_youtube_url("HTTPS://WWW.YOUTUBE.COM/watch?v=abc"));
        assert!(is_youtube_url("https://YouTu.Be/abc"));
    }

    #[test]
    fn test_extract_video_id_from_watch_url() {
        assert_eq!(
            extract_youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_youtube_video_id("https://www.youtube.com/watch?t=10&v=abc123").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_extract_video_id_from_short_url() {
        assert_eq!(
            extract_youtube_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_extract_video_id_missing() {
        assert!(extract_youtube_video_id("https://www.youtube.com/").is_none());
        assert!(extract_youtube_video_id("not a url at all").is_none());
    }
}
