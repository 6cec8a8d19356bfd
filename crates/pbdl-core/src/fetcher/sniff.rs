//! Failure-marker detection in the leading bytes of a response.

/// First marker from `markers` present in `head`, decoded leniently as text.
/// Empty markers never match.
pub fn find_marker<'m>(head: &[u8], markers: &'m [String]) -> Option<&'m str> {
    let text = String::from_utf8_lossy(head);
    markers
        .iter()
        .map(String::as_str)
        .find(|m| !m.is_empty() && text.contains(m))
}
