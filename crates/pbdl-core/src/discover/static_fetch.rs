//! Static-fetch strategy: scrape the served page, read the recording's
//! auxiliary resources, and probe conventional media paths.

use std::fs;
use std::path::PathBuf;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::session::Session;

use super::patterns::{scrape_metadata_xml, scrape_page, scrape_shapes_svg};
use super::{Discoverer, MediaClass, MediaUrls};

/// Bytes requested by a path probe (`Range: bytes=0-1023`).
const PROBE_WINDOW: u64 = 1024;

type AuxScraper = fn(&Url, &str) -> MediaUrls;

/// Auxiliary recording resources and how to read them.
const AUXILIARY: [(&str, AuxScraper); 2] = [
    ("/presentation/metadata.xml", scrape_metadata_xml),
    ("/presentation/shapes.svg", scrape_shapes_svg),
];

pub struct StaticDiscoverer {
    config: DiscoveryConfig,
    page_dump: Option<PathBuf>,
}

impl StaticDiscoverer {
    /// `page_dump`, when set, receives the raw page body for diagnostics.
    pub fn new(config: DiscoveryConfig, page_dump: Option<PathBuf>) -> Self {
        Self { config, page_dump }
    }

    fn dump_page(&self, body: &str) {
        let Some(path) = self.page_dump.as_ref() else {
            return;
        };
        match fs::write(path, body) {
            Ok(()) => tracing::info!(path = %path.display(), "saved page source"),
            Err(e) => tracing::warn!(path = %path.display(), "could not save page source: {}", e),
        }
    }

    fn probe_paths(&self) -> impl Iterator<Item = (MediaClass, &str)> + '_ {
        self.config
            .video_probe_paths
            .iter()
            .map(|p| (MediaClass::Video, p.as_str()))
            .chain(
                self.config
                    .audio_probe_paths
                    .iter()
                    .map(|p| (MediaClass::Audio, p.as_str())),
            )
    }
}

impl Discoverer for StaticDiscoverer {
    fn name(&self) -> &str {
        "static-fetch"
    }

    fn discover(&mut self, session: &mut Session) -> MediaUrls {
        let base = session.page_url().clone();
        let mut found = MediaUrls::new();

        if let Some(body) = fetch_page(session, &base) {
            self.dump_page(&body);
            found.extend(scrape_page(&base, &body));
        }

        for (path, scrape) in AUXILIARY {
            if let Some(text) = fetch_auxiliary(session, &base, path) {
                found.extend(scrape(&base, &text));
            }
        }

        for (class, path) in self.probe_paths() {
            if let Some(url) = probe_media_path(session, &base, path) {
                found.insert(class, url);
            }
        }

        for url in &found.video {
            tracing::info!(url = %url, "video candidate");
        }
        for url in &found.audio {
            tracing::info!(url = %url, "audio candidate");
        }
        found
    }
}

fn fetch_page(session: &mut Session, base: &Url) -> Option<String> {
    match session.get_text(base.as_str()) {
        Ok(page) if page.head.is_success() => Some(page.body),
        Ok(page) => {
            tracing::warn!(url = %base, status = page.head.status, "page fetch returned an error status");
            None
        }
        Err(e) => {
            tracing::warn!(url = %base, "page fetch failed: {:#}", e);
            None
        }
    }
}

/// Body of an auxiliary resource, only when the server answers 200.
fn fetch_auxiliary(session: &mut Session, base: &Url, path: &str) -> Option<String> {
    let url = base.join(path).ok()?;
    match session.get_text(url.as_str()) {
        Ok(resp) if resp.head.status == 200 => Some(resp.body),
        Ok(resp) => {
            tracing::debug!(url = %url, status = resp.head.status, "auxiliary resource not available");
            None
        }
        Err(e) => {
            tracing::debug!(url = %url, "auxiliary fetch failed: {:#}", e);
            None
        }
    }
}

/// A conventional path counts as media when a ranged GET answers 200/206 and
/// the body is not an XML error document.
fn probe_media_path(session: &mut Session, base: &Url, path: &str) -> Option<String> {
    let url = base.join(path).ok()?;
    match session.probe(url.as_str(), PROBE_WINDOW) {
        Ok(head) if head.status == 200 || head.status == 206 => {
            if head.content_type_lower().contains("xml") {
                tracing::debug!(url = %url, "probe answered with an XML payload");
                None
            } else {
                tracing::debug!(url = %url, status = head.status, "probe hit");
                Some(url.into())
            }
        }
        Ok(head) => {
            tracing::debug!(url = %url, status = head.status, "probe miss");
            None
        }
        Err(e) => {
            tracing::debug!(url = %url, "probe failed: {:#}", e);
            None
        }
    }
}
