//! Rendered-page strategy: let a real browser run the player, then read the
//! DOM, the captured network traffic, and an in-page element enumeration.

use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::browser::{Browser, BrowserConnector, NetworkEntry};
use crate::session::Session;

use super::resolve::resolve_media_url;
use super::{Discoverer, MediaClass, MediaUrls};

/// Extensions a network response URL must carry to be considered media.
const MEDIA_EXTENSIONS: [&str; 4] = [".webm", ".mp4", ".ogg", ".mp3"];

/// Markers that make a `<video src>` worth keeping.
const VIDEO_MARKERS: [&str; 3] = ["video", "deskshare", "camera"];

/// Lists `video.src` and nested `source.src` values from the live DOM.
const MEDIA_ELEMENT_SCRIPT: &str = r#"
var videos = [];
document.querySelectorAll('video').forEach(function(video) {
    if (video.src) videos.push(video.src);
    video.querySelectorAll('source').forEach(function(source) {
        if (source.src) videos.push(source.src);
    });
});
return videos;
"#;

pub struct RenderedDiscoverer<C: BrowserConnector> {
    connector: C,
    settle: Duration,
}

impl<C: BrowserConnector> RenderedDiscoverer<C> {
    pub fn new(connector: C, settle_secs: u64) -> Self {
        Self {
            connector,
            settle: Duration::from_secs(settle_secs),
        }
    }
}

impl<C: BrowserConnector> Discoverer for RenderedDiscoverer<C> {
    fn name(&self) -> &str {
        "rendered-page"
    }

    fn discover(&mut self, session: &mut Session) -> MediaUrls {
        let base = session.page_url().clone();
        let mut browser = match self.connector.connect() {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("browser unavailable, skipping rendered discovery: {}", e);
                return MediaUrls::new();
            }
        };
        if let Err(e) = browser.navigate(base.as_str()) {
            tracing::warn!(url = %base, "browser navigation failed: {}", e);
            return MediaUrls::new();
        }
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        collect(&mut browser, &base)
    }
}

/// Run every collection step; each failing step just contributes nothing.
fn collect<B: Browser>(browser: &mut B, base: &Url) -> MediaUrls {
    let mut found = MediaUrls::new();

    match browser.element_properties("video", "src") {
        Ok(srcs) => found.extend(from_video_elements(base, &srcs)),
        Err(e) => tracing::debug!("video element lookup failed: {}", e),
    }
    match browser.element_properties("source", "src") {
        Ok(srcs) => found.extend(from_source_elements(base, &srcs)),
        Err(e) => tracing::debug!("source element lookup failed: {}", e),
    }
    match browser.network_log() {
        Ok(entries) => found.extend(from_network_log(&entries)),
        Err(e) => tracing::debug!("network log unavailable: {}", e),
    }
    match browser.execute_script(MEDIA_ELEMENT_SCRIPT) {
        Ok(value) => found.extend(from_script_result(base, &value)),
        Err(e) => tracing::debug!("media element script failed: {}", e),
    }

    tracing::info!(
        videos = found.video.len(),
        audio = found.audio.len(),
        "rendered page inspected"
    );
    found
}

fn from_video_elements(base: &Url, srcs: &[String]) -> MediaUrls {
    let mut found = MediaUrls::new();
    for src in srcs {
        let lower = src.to_lowercase();
        if !VIDEO_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }
        if let Some(url) = resolve_media_url(base, src) {
            found.insert(MediaClass::Video, url);
        }
    }
    found
}

fn from_source_elements(base: &Url, srcs: &[String]) -> MediaUrls {
    let mut found = MediaUrls::new();
    for url in srcs.iter().filter_map(|s| resolve_media_url(base, s)) {
        let lower = url.to_lowercase();
        if lower.contains("video") {
            found.insert(MediaClass::Video, url);
        } else if lower.contains("audio") {
            found.insert(MediaClass::Audio, url);
        }
    }
    found
}

fn from_network_log(entries: &[NetworkEntry]) -> MediaUrls {
    let mut found = MediaUrls::new();
    for entry in entries.iter().filter(|e| e.is_response()) {
        let Some(url) = entry.url.as_deref() else { continue };
        let lower = url.to_lowercase();
        if !MEDIA_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
            continue;
        }
        let content_type = entry
            .content_type
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();
        if content_type.contains("video") || lower.contains("video") {
            found.insert(MediaClass::Video, url);
        } else if content_type.contains("audio") || lower.contains("audio") {
            found.insert(MediaClass::Audio, url);
        }
    }
    found
}

fn from_script_result(base: &Url, value: &Value) -> MediaUrls {
    let mut found = MediaUrls::new();
    let Some(items) = value.as_array() else {
        return found;
    };
    for url in items
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|s| resolve_media_url(base, s))
    {
        if url.to_lowercase().contains("video") {
            found.insert(MediaClass::Video, url);
        }
    }
    found
}
