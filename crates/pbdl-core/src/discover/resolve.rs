//! Turning scraped URL fragments into absolute URLs.

use url::Url;

/// Resolve a scraped media reference against the page URL.
///
/// - `/path` joins against the origin (root-relative, never relative to the
///   page's own directory);
/// - `http…` is kept as-is when it parses;
/// - anything else is treated as root-relative after stripping leading slashes.
///
/// JSON-escaped slashes (`\/`) are unescaped first. Returns `None` for
/// fragments that cannot form a URL.
pub fn resolve_media_url(base: &Url, raw: &str) -> Option<String> {
    let unescaped = raw.trim().replace("\\/", "/");
    let candidate = unescaped.as_str();
    if candidate.is_empty() {
        return None;
    }
    if candidate.starts_with('/') {
        return base.join(candidate).ok().map(String::from);
    }
    if candidate.starts_with("http") {
        return Url::parse(candidate).ok().map(|_| candidate.to_string());
    }
    base.join(&format!("/{}", candidate.trim_start_matches('/')))
        .ok()
        .map(String::from)
}

/// Standard relative join (document-relative for bare paths), used for
/// references found in auxiliary XML/SVG resources.
pub fn join_relative(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    base.join(raw).ok().map(String::from)
}
