//! `pbdl get <url> <dest>` – one validated download.

use anyhow::{Context, Result};
use pbdl_core::config::PbdlConfig;
use pbdl_core::fetcher::download;
use pbdl_core::session::Session;
use std::path::Path;

use crate::cli::console::{describe_outcome, ConsoleReporter};

pub fn run_get(cfg: &PbdlConfig, url: &str, dest: &Path, referer: Option<&str>) -> Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }

    let mut session = Session::new(referer.unwrap_or(url), &cfg.http)?;
    let reporter = ConsoleReporter::new();
    println!("Downloading {}", url);
    let outcome = download(&mut session, url, dest, &cfg.fetch, &reporter);
    reporter.end_line();
    println!("{}", describe_outcome(&outcome));

    outcome
        .map(|_| ())
        .with_context(|| format!("download of {} failed", url))
}
