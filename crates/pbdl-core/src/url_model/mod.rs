//! Destination file names for discovered media.

mod path;
mod sanitize;

pub use path::last_path_segment;
pub use sanitize::sanitize_file_name;

use crate::discover::MediaClass;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name for the `index`-th (1-based) URL of `class`.
///
/// Uses the URL's last path segment when it sanitizes to something usable,
/// else `video_<n>.webm` / `audio_<n>.ogg`.
///
/// - `media_filename("https://host/presentation/x/deskshare/deskshare.webm", Video, 1)` → `"deskshare.webm"`
/// - `media_filename("https://host/", Audio, 2)` → `"audio_2.ogg"`
pub fn media_filename(url: &str, class: MediaClass, index: usize) -> String {
    last_path_segment(url)
        .map(|s| sanitize_file_name(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("{}_{}.{}", class.label(), index, class.fallback_extension()))
}

/// Hands out destination paths inside one directory, never the same one twice.
///
/// Several recordings name their streams identically (`webcams.webm` under
/// both `video/` and `deskshare/`); later names get a `-<n>` suffix before the
/// extension.
#[derive(Debug)]
pub struct DestinationNames {
    dir: PathBuf,
    taken: HashSet<String>,
}

impl DestinationNames {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            taken: HashSet::new(),
        }
    }

    /// Reserve `name` (or a suffixed variant) and return its full path.
    pub fn claim(&mut self, name: &str) -> PathBuf {
        let mut candidate = name.to_string();
        let mut n = 1;
        while self.taken.contains(&candidate) {
            n += 1;
            candidate = with_suffix(name, n);
        }
        self.taken.insert(candidate.clone());
        self.dir.join(candidate)
    }
}

fn with_suffix(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", name, n),
    }
}
