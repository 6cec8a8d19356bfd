//! Console rendering: banner, discovered URLs, a `\r` progress line per file
//! and one result line per download.

use pbdl_core::discover::{MediaClass, MediaUrls};
use pbdl_core::fetcher::{DownloadOutcome, FetchFailure, Progress, ProgressSink};
use pbdl_core::harvest::{FileReport, HarvestObserver};
use std::cell::Cell;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

pub fn print_banner(url: &str, output: &Path) {
    println!("pbdl {}", env!("CARGO_PKG_VERSION"));
    println!("  page:   {}", url);
    println!("  output: {}", output.display());
    println!();
}

/// One human-readable line for a finished download.
pub fn describe_outcome(outcome: &DownloadOutcome) -> String {
    match outcome {
        Ok(saved) if saved.suspiciously_small => format!(
            "  saved {} ({} bytes, suspiciously small: probably not media)",
            saved.path.display(),
            saved.bytes
        ),
        Ok(saved) => format!(
            "  saved {} ({:.1} MiB)",
            saved.path.display(),
            saved.bytes as f64 / 1_048_576.0
        ),
        Err(FetchFailure::Unsupported { marker }) => {
            format!("  skipped: server answered with an error document ({})", marker)
        }
        Err(e) => format!("  failed: {}", e),
    }
}

/// Prints progress and per-file results to stdout.
#[derive(Default)]
pub struct ConsoleReporter {
    line_open: Cell<bool>,
    last_print: Cell<Option<Instant>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminate an open progress line.
    pub fn end_line(&self) {
        if self.line_open.replace(false) {
            println!();
        }
        self.last_print.set(None);
    }
}

impl ProgressSink for ConsoleReporter {
    fn report(&self, progress: Progress) {
        let now = Instant::now();
        let complete = progress.percent().is_some_and(|p| p >= 100.0);
        let due = self
            .last_print
            .get()
            .map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL);
        if !due && !complete {
            return;
        }

        let done_mib = progress.downloaded() as f64 / 1_048_576.0;
        match progress {
            Progress::Percent { total, percent, .. } => print!(
                "\r  {:.1} / {:.1} MiB ({:.1}%)  ",
                done_mib,
                total as f64 / 1_048_576.0,
                percent
            ),
            Progress::Bytes { .. } => print!("\r  {:.1} MiB  ", done_mib),
        }
        let _ = std::io::stdout().flush();
        self.line_open.set(true);
        self.last_print.set(Some(now));
    }
}

impl HarvestObserver for ConsoleReporter {
    fn discovered(&self, urls: &MediaUrls) {
        if urls.is_empty() {
            return;
        }
        for class in [MediaClass::Video, MediaClass::Audio] {
            let set = urls.set(class);
            if set.is_empty() {
                continue;
            }
            println!("Found {} {} URL(s):", set.len(), class);
            for url in set {
                println!("  {}", url);
            }
        }
        println!();
    }

    fn file_started(&self, class: MediaClass, url: &str, destination: &Path) {
        println!("Downloading {} {}", class, url);
        println!("  -> {}", destination.display());
    }

    fn file_finished(&self, report: &FileReport) {
        self.end_line();
        println!("{}", describe_outcome(&report.outcome));
    }
}
