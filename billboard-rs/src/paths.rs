//! Folder path rules.
//!
//! Folder paths are relative to the media root and always `/`-separated, whatever the client
//! sent. Media URLs are `<media prefix>/<folder>/<file name>`.

use crate::api::MediaKind;
use thiserror::Error;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path may not contain '..'")]
    ParentSegment,
}

/// Normalize a folder path: backslashes become slashes, empty and `.` segments are dropped.
///
/// Rejects `..` anywhere, and paths with nothing left after normalization.
pub fn normalize(raw: &str) -> Result<String, PathError> {
    let mut out = String::with_capacity(raw.len());
    for segment in raw.trim().split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return Err(PathError::ParentSegment),
            segment => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str(segment);
            }
        }
    }
    if out.is_empty() {
        Err(PathError::Empty)
    } else {
        Ok(out)
    }
}

/// Whether any segment of `path` equals `segment`, ignoring ASCII case.
pub fn has_segment(path: &str, segment: &str) -> bool {
    path.split('/').any(|s| s.eq_ignore_ascii_case(segment))
}

/// Whether `path` lies strictly below `ancestor`. Both must be normalized.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Whether `path` is `folder` or lies below it.
pub fn is_within(path: &str, folder: &str) -> bool {
    path == folder || is_descendant(path, folder)
}

/// Split a normalized path into its parent folder and final segment.
///
/// Returns `None` for single-segment paths, since every media file lives inside a folder.
pub fn split_file(path: &str) -> Option<(&str, &str)> {
    path.rsplit_once('/')
}

/// Public URL of the file at `path` (relative to the media root).
pub fn media_url(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), path)
}

/// Inverse of [`media_url`]: the media-root-relative path a URL points at.
///
/// Accepts absolute URLs as long as their path starts with the prefix.
pub fn path_of_url(prefix: &str, url: &str) -> Option<String> {
    let prefix = prefix.trim_end_matches('/');
    let path = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            &rest[rest.find('/')?..]
        }
        None => url,
    };
    let relative = path.strip_prefix(prefix)?.strip_prefix('/')?;
    normalize(relative).ok()
}

/// Lower-case extension of a file name, if any.
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Kind of media a file name refers to, judged by extension. `None` for anything that is not
/// displayable.
pub fn media_kind(name: &str) -> Option<MediaKind> {
    let ext = extension(name)?;
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

pub fn is_video(name: &str) -> bool {
    media_kind(name) == Some(MediaKind::Video)
}

/// The route a folder belongs to: its first segment naming one of `routes`.
pub fn infer_route<'r>(folder: &str, routes: &'r [String]) -> Option<&'r str> {
    folder.split('/').find_map(|segment| {
        routes
            .iter()
            .find(|route| route.eq_ignore_ascii_case(segment))
            .map(String::as_str)
    })
}

/// Route names are used as keys and in URLs: non-empty, ASCII alphanumerics, `-` and `_`.
pub fn is_valid_route(route: &str) -> bool {
    !route.is_empty()
        && route
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_dots() {
        assert_eq!(
            normalize("2025\\internal\\March").unwrap(),
            "2025/internal/March"
        );
        assert_eq!(
            normalize(" /2025//internal/./March/ ").unwrap(),
            "2025/internal/March"
        );
        assert_eq!(normalize("a/../b"), Err(PathError::ParentSegment));
        assert_eq!(normalize("/./"), Err(PathError::Empty));
        assert_eq!(normalize(""), Err(PathError::Empty));
    }

    #[test]
    fn descendants() {
        assert!(is_descendant("2025/internal/March", "2025/internal"));
        assert!(!is_descendant("2025/internal", "2025/internal"));
        assert!(!is_descendant("2025/internals", "2025/internal"));
        assert!(is_within("2025/internal", "2025/internal"));
    }

    #[test]
    fn segment_matching_ignores_case() {
        assert!(has_segment("2025/Internal/March", "internal"));
        assert!(!has_segment("2025/external/March", "internal"));
        assert!(!has_segment("2025-internal", "internal"));
    }

    #[test]
    fn urls_round_trip_through_paths() {
        let url = media_url("/media/", "2025/internal/March/a.png");
        assert_eq!(url, "/media/2025/internal/March/a.png");
        assert_eq!(
            path_of_url("/media", &url).as_deref(),
            Some("2025/internal/March/a.png")
        );
        assert_eq!(
            path_of_url("/media", "https://signs.example.org/media/2025/a.png").as_deref(),
            Some("2025/a.png")
        );
        assert_eq!(path_of_url("/media", "/other/2025/a.png"), None);
        assert_eq!(path_of_url("/media", "/mediax/a.png"), None);
        assert_eq!(path_of_url("/media", "/media/../etc/passwd"), None);
    }

    #[test]
    fn split_file_needs_a_folder() {
        assert_eq!(
            split_file("2025/internal/a.png"),
            Some(("2025/internal", "a.png"))
        );
        assert_eq!(split_file("a.png"), None);
    }

    #[test]
    fn media_kinds_by_extension() {
        assert_eq!(media_kind("poster.JPG"), Some(MediaKind::Image));
        assert_eq!(media_kind("clip.webm"), Some(MediaKind::Video));
        assert_eq!(media_kind("notes.txt"), None);
        assert_eq!(media_kind(".png"), None);
        assert_eq!(media_kind("png"), None);
        assert!(is_video("intro.MOV"));
    }

    #[test]
    fn route_inference_uses_first_known_segment() {
        let routes = vec!["internal".to_string(), "external".to_string()];
        assert_eq!(infer_route("2025/Internal/March", &routes), Some("internal"));
        assert_eq!(infer_route("external/2025", &routes), Some("external"));
        assert_eq!(infer_route("2025/lobby", &routes), None);
    }

    #[test]
    fn route_names() {
        assert!(is_valid_route("internal"));
        assert!(is_valid_route("lobby-2"));
        assert!(!is_valid_route(""));
        assert!(!is_valid_route("../x"));
        assert!(!is_valid_route("a b"));
    }
}
