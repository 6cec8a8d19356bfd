//! Last-segment extraction from media URLs.

/// Last non-empty path segment of `url`, ignoring query and fragment.
///
/// `None` when the URL does not parse, has no path, or ends in `.`/`..`.
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;
    match segment {
        "." | ".." => None,
        s => Some(s.to_string()),
    }
}
