//! Streaming media download with response validation.
//!
//! The leading `sniff_bytes` of every body are checked for server failure markers before
//! anything touches disk; accepted bodies stream into a `.part` file that is
//! renamed into place on success and removed on failure.

mod progress;
mod sniff;
mod stream;

pub use progress::{NoProgress, Progress, ProgressSink};
pub use sniff::find_marker;

use std::path::{Path, PathBuf};

use crate::config::FetchConfig;
use crate::session::Session;
use stream::MediaStream;

/// A destination file that was written completely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub bytes: u64,
    /// Below the configured threshold; likely an error page rather than media.
    pub suspiciously_small: bool,
}

/// Why a download produced no file.
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    /// The body opened with a server failure marker.
    #[error("server rejected the request ({marker})")]
    Unsupported { marker: String },
    #[error("HTTP {0}")]
    Http(u32),
    #[error("download timed out: {0}")]
    Timeout(#[source] curl::Error),
    #[error("transfer failed: {0}")]
    Transport(#[source] curl::Error),
    #[error("storage: {0}")]
    Storage(#[source] std::io::Error),
}

pub type DownloadOutcome = Result<SavedFile, FetchFailure>;

/// Download `url` into `dest` through the session's cookies and headers.
///
/// Never panics on network or server failure; every failure mode ends up in
/// the returned outcome and leaves no file at `dest`.
pub fn download(
    session: &mut Session,
    url: &str,
    dest: &Path,
    fetch: &FetchConfig,
    progress: &dyn ProgressSink,
) -> DownloadOutcome {
    tracing::info!(url, dest = %dest.display(), "downloading");

    let mut stream = MediaStream::new(dest, fetch, progress);
    let result = session.stream(url, |head, data| stream.accept(head, data));
    let outcome = stream.finish(result);

    match &outcome {
        Ok(saved) => tracing::info!(
            path = %saved.path.display(),
            bytes = saved.bytes,
            "download complete"
        ),
        Err(e) => tracing::warn!(url, "download failed: {}", e),
    }
    outcome
}
