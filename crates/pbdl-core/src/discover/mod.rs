//! Media URL discovery for a playback page.
//!
//! Every strategy implements `Discoverer` and never fails: a heuristic that
//! errors simply contributes nothing. `FirstNonEmpty` chains strategies so the
//! first one that finds anything wins.

mod patterns;
mod rendered;
mod resolve;
mod static_fetch;

pub use patterns::{scrape_metadata_xml, scrape_page, scrape_shapes_svg};
pub use rendered::RenderedDiscoverer;
pub use resolve::{join_relative, resolve_media_url};
pub use static_fetch::StaticDiscoverer;

use crate::browser::ChromeConnector;
use crate::config::{DiscoveryConfig, HttpConfig};
use crate::session::Session;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Which kind of stream a URL carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaClass {
    Video,
    Audio,
}

impl MediaClass {
    /// Extension used when a URL yields no usable file name.
    pub fn fallback_extension(self) -> &'static str {
        match self {
            MediaClass::Video => "webm",
            MediaClass::Audio => "ogg",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaClass::Video => "video",
            MediaClass::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Deduplicated absolute media URLs, split by class.
///
/// Ordered sets only keep console output stable; nothing depends on the order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaUrls {
    pub video: BTreeSet<String>,
    pub audio: BTreeSet<String>,
}

impl MediaUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `url` into the set for `class`; false if it was already present.
    pub fn insert(&mut self, class: MediaClass, url: impl Into<String>) -> bool {
        self.set_mut(class).insert(url.into())
    }

    pub fn set(&self, class: MediaClass) -> &BTreeSet<String> {
        match class {
            MediaClass::Video => &self.video,
            MediaClass::Audio => &self.audio,
        }
    }

    fn set_mut(&mut self, class: MediaClass) -> &mut BTreeSet<String> {
        match class {
            MediaClass::Video => &mut self.video,
            MediaClass::Audio => &mut self.audio,
        }
    }

    /// Merge `other` into `self`.
    pub fn extend(&mut self, other: MediaUrls) {
        self.video.extend(other.video);
        self.audio.extend(other.audio);
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty()
    }

    pub fn len(&self) -> usize {
        self.video.len() + self.audio.len()
    }

    /// All URLs, videos first, each tagged with its class.
    pub fn iter(&self) -> impl Iterator<Item = (MediaClass, &str)> + '_ {
        self.video
            .iter()
            .map(|u| (MediaClass::Video, u.as_str()))
            .chain(self.audio.iter().map(|u| (MediaClass::Audio, u.as_str())))
    }
}

/// A source of candidate media URLs for the session's page.
pub trait Discoverer {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn discover(&mut self, session: &mut Session) -> MediaUrls;
}

/// Runs strategies in order and returns the first non-empty result.
#[derive(Default)]
pub struct FirstNonEmpty {
    strategies: Vec<Box<dyn Discoverer>>,
}

impl FirstNonEmpty {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, strategy: impl Discoverer + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Discoverer for FirstNonEmpty {
    fn name(&self) -> &str {
        "first-non-empty"
    }

    fn discover(&mut self, session: &mut Session) -> MediaUrls {
        for strategy in self.strategies.iter_mut() {
            let found = strategy.discover(session);
            if !found.is_empty() {
                tracing::info!(
                    strategy = strategy.name(),
                    videos = found.video.len(),
                    audio = found.audio.len(),
                    "discovery succeeded"
                );
                return found;
            }
            tracing::info!(strategy = strategy.name(), "strategy found nothing");
        }
        MediaUrls::new()
    }
}

/// The standard chain: rendered-page discovery in headless Chrome when
/// enabled, then static fetching. The page dump lands in `output_dir`.
pub fn default_chain(
    discovery: &DiscoveryConfig,
    http: &HttpConfig,
    output_dir: &Path,
) -> FirstNonEmpty {
    let mut chain = FirstNonEmpty::new();
    if discovery.uses_browser() {
        chain = chain.then(RenderedDiscoverer::new(
            ChromeConnector::new(discovery.chrome_path.clone(), http),
            discovery.settle_secs,
        ));
    }
    chain.then(StaticDiscoverer::new(
        discovery.clone(),
        Some(output_dir.join(&discovery.page_dump_name)),
    ))
}
