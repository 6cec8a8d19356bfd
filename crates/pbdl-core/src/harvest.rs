//! One full run: discover media for the session's page and download it all.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::FetchConfig;
use crate::discover::{Discoverer, MediaClass, MediaUrls};
use crate::fetcher::{self, DownloadOutcome, NoProgress, ProgressSink};
use crate::session::Session;
use crate::url_model::{media_filename, DestinationNames};

/// Result of one downloaded (or failed) URL.
#[derive(Debug)]
pub struct FileReport {
    pub class: MediaClass,
    pub url: String,
    pub destination: PathBuf,
    pub outcome: DownloadOutcome,
}

#[derive(Debug)]
pub enum HarvestSummary {
    /// Discovery came back empty; `hint` names where to look manually.
    NothingFound { hint: String },
    Completed(Vec<FileReport>),
}

impl HarvestSummary {
    pub fn reports(&self) -> &[FileReport] {
        match self {
            HarvestSummary::NothingFound { .. } => &[],
            HarvestSummary::Completed(reports) => reports,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.reports().iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports().iter().filter(|r| r.outcome.is_err()).count()
    }
}

/// Hooks for reporting a run as it happens. All default to no-ops.
pub trait HarvestObserver: ProgressSink {
    fn discovered(&self, _urls: &MediaUrls) {}

    fn file_started(&self, _class: MediaClass, _url: &str, _destination: &Path) {}

    fn file_finished(&self, _report: &FileReport) {}
}

impl HarvestObserver for NoProgress {}

/// Run discovery through `discoverer` and download every candidate into
/// `output_dir`, videos first.
///
/// Only failing to create `output_dir` is an error; per-file failures are
/// recorded in the summary.
pub fn harvest<O: HarvestObserver>(
    session: &mut Session,
    discoverer: &mut dyn Discoverer,
    output_dir: &Path,
    fetch: &FetchConfig,
    observer: &O,
) -> Result<HarvestSummary> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;

    tracing::info!(
        page = %session.page_url(),
        strategy = discoverer.name(),
        "starting discovery"
    );
    let urls = discoverer.discover(session);
    observer.discovered(&urls);

    if urls.is_empty() {
        let hint = format!("{}/presentation/", session.site_root());
        tracing::warn!(hint = %hint, "no media URLs found");
        return Ok(HarvestSummary::NothingFound { hint });
    }

    let mut names = DestinationNames::new(output_dir);
    let mut reports = Vec::with_capacity(urls.len());
    for class in [MediaClass::Video, MediaClass::Audio] {
        for (i, url) in urls.set(class).iter().enumerate() {
            let destination = names.claim(&media_filename(url, class, i + 1));
            observer.file_started(class, url, &destination);

            let outcome = fetcher::download(session, url, &destination, fetch, observer);
            let report = FileReport {
                class,
                url: url.clone(),
                destination,
                outcome,
            };
            observer.file_finished(&report);
            reports.push(report);
        }
    }

    let summary = HarvestSummary::Completed(reports);
    tracing::info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "run finished"
    );
    Ok(summary)
}
