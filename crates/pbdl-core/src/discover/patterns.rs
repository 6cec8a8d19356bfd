//! Pattern battery for page bodies and auxiliary recording resources.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::resolve::{join_relative, resolve_media_url};
use super::{MediaClass, MediaUrls};

struct PagePattern {
    re: Regex,
    class: MediaClass,
    /// Resolved URL must contain this (lowercased) to be kept.
    require: Option<&'static str>,
}

fn page_pattern(re: &str, class: MediaClass, require: Option<&'static str>) -> PagePattern {
    PagePattern {
        re: Regex::new(re).unwrap(),
        class,
        require,
    }
}

lazy_static! {
    static ref PAGE_PATTERNS: Vec<PagePattern> = {
        use MediaClass::{Audio, Video};
        vec![
            // JS string literals (case-insensitive), filtered by class marker.
            page_pattern(r#"(?i)["']([^"']*presentation[^"']*video[^"']*\.(webm|mp4))["']"#, Video, Some("video")),
            page_pattern(r#"(?i)["']([^"']*presentation[^"']*deskshare[^"']*\.(webm|mp4))["']"#, Video, Some("video")),
            page_pattern(r#"(?i)["']([^"']*presentation[^"']*camera[^"']*\.(webm|mp4))["']"#, Video, Some("video")),
            page_pattern(r#"(?i)src:\s*["']([^"']*video[^"']*)["']"#, Video, Some("video")),
            page_pattern(r#"(?i)url:\s*["']([^"']*video[^"']*)["']"#, Video, Some("video")),
            page_pattern(r#"(?i)["']([^"']*presentation[^"']*audio[^"']*\.(ogg|mp3|webm))["']"#, Audio, Some("audio")),
            page_pattern(r#"(?i)src:\s*["']([^"']*audio[^"']*)["']"#, Audio, Some("audio")),
            page_pattern(r#"(?i)url:\s*["']([^"']*audio[^"']*)["']"#, Audio, Some("audio")),
            // Quoted recording paths and JSON members (case-sensitive, unfiltered).
            page_pattern(r#""(/presentation/[^"]+video\.webm)""#, Video, None),
            page_pattern(r#""(/presentation/[^"]+video\.mp4)""#, Video, None),
            page_pattern(r#""(/presentation/[^"]+deskshare\.webm)""#, Video, None),
            page_pattern(r#""(/presentation/[^"]+deskshare\.mp4)""#, Video, None),
            page_pattern(r#""video":"([^"]+video[^"]+)""#, Video, None),
            page_pattern(r#""deskshare":"([^"]+deskshare[^"]+)""#, Video, None),
            page_pattern(r#""(/presentation/[^"]+audio\.ogg)""#, Audio, None),
            page_pattern(r#""(/presentation/[^"]+audio\.mp3)""#, Audio, None),
            page_pattern(r#""audio":"([^"]+audio[^"]+)""#, Audio, None),
        ]
    };
    static ref METADATA_VIDEO: Regex = Regex::new(r#"<video src="([^"]+)""#).unwrap();
    static ref SHAPES_VIDEO: Regex = Regex::new(r#"href="([^"]+video[^"]+)""#).unwrap();
}

/// Run the page pattern battery over `text`, resolving matches against `base`.
pub fn scrape_page(base: &Url, text: &str) -> MediaUrls {
    let mut found = MediaUrls::new();
    for pattern in PAGE_PATTERNS.iter() {
        for caps in pattern.re.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let Some(url) = resolve_media_url(base, m.as_str()) else {
                continue;
            };
            if let Some(marker) = pattern.require {
                if !url.to_lowercase().contains(marker) {
                    continue;
                }
            }
            found.insert(pattern.class, url);
        }
    }
    found
}

/// `<video src="…">` references in a recording's `metadata.xml`.
pub fn scrape_metadata_xml(base: &Url, text: &str) -> MediaUrls {
    scrape_videos(&METADATA_VIDEO, base, text)
}

/// `href="…video…"` references in a recording's `shapes.svg`.
pub fn scrape_shapes_svg(base: &Url, text: &str) -> MediaUrls {
    scrape_videos(&SHAPES_VIDEO, base, text)
}

fn scrape_videos(re: &Regex, base: &Url, text: &str) -> MediaUrls {
    let mut found = MediaUrls::new();
    for caps in re.captures_iter(text) {
        if let Some(url) = caps.get(1).and_then(|m| join_relative(base, m.as_str())) {
            found.insert(MediaClass::Video, url);
        }
    }
    found
}
