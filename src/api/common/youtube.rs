use url::Url;

pub const YOUTUBE_ID_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    Default,
    Medium,
    #[default]
    High,
    Standard,
    Maxres,
}

impl ThumbnailQuality {
    fn file_name(&self) -> &'static str {
        match self {
            ThumbnailQuality::Default => "default",
            ThumbnailQuality::Medium => "mqdefault",
            ThumbnailQuality::High => "hqdefault",
            ThumbnailQuality::Standard => "sddefault",
            ThumbnailQuality::Maxres => "maxresdefault",
        }
    }
}

pub fn is_video_id(candidate: &str) -> bool {
    candidate.len() == YOUTUBE_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Pulls the 11-character video id out of the URL shapes YouTube hands out,
/// or accepts a bare id.
pub fn extract_youtube_id(input: &str) -> Option<String> {
    let input = input.trim();
    if is_video_id(input) {
        return Some(input.to_string());
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())
                    .or_else(|| segments.next().map(str::to_string)),
                Some("embed") | Some("v") | Some("shorts") | Some("live") => {
                    segments.next().map(str::to_string)
                }
                _ => None,
            }
        }
        _ => None,
    }?;

    is_video_id(&candidate).then_some(candidate)
}

pub fn thumbnail_url(id: &str, quality: ThumbnailQuality) -> String {
    format!("https://img.youtube.com/vi/{}/{}.jpg", id, quality.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ids_from_known_url_shapes() {
        let id = "dQw4w9WgXcQ";
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://youtube.com/v/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ",
            "https://m.youtube.com/watch/dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_youtube_id(input).as_deref(), Some(id), "{}", input);
        }
    }

    #[test]
    fn rejects_other_urls() {
        assert_eq!(extract_youtube_id("https://vimeo.com/123456789"), None);
        assert_eq!(extract_youtube_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(extract_youtube_id("not a url"), None);
    }

    #[test]
    fn builds_thumbnail_urls() {
        assert_eq!(
            thumbnail_url("abc", ThumbnailQuality::High),
            "https://img.youtube.com/vi/abc/hqdefault.jpg"
        );
        assert_eq!(
            thumbnail_url("abc", ThumbnailQuality::Maxres),
            "https://img.youtube.com/vi/abc/maxresdefault.jpg"
        );
    }
}
