//! `pbdl fetch <url>` – discover and download everything.

use anyhow::Result;
use pbdl_core::discover::default_chain;
use pbdl_core::harvest::{harvest, HarvestSummary};

use super::{effective_config, open_session};
use crate::cli::console::{print_banner, ConsoleReporter};
use crate::cli::TargetArgs;
use pbdl_core::config::PbdlConfig;

pub fn run_fetch(cfg: &PbdlConfig, target: &TargetArgs) -> Result<()> {
    let cfg = effective_config(cfg, target);
    print_banner(&target.url, &target.output);

    let mut session = open_session(&cfg, target)?;
    let mut chain = default_chain(&cfg.discovery, &cfg.http, &target.output);
    let reporter = ConsoleReporter::new();

    let summary = harvest(
        &mut session,
        &mut chain,
        &target.output,
        &cfg.fetch,
        &reporter,
    )?;

    match &summary {
        HarvestSummary::NothingFound { hint } => {
            println!("No media URLs found.");
            println!("Check {} manually.", hint);
            println!(
                "The page source was saved to {}",
                target.output.join(&cfg.discovery.page_dump_name).display()
            );
        }
        HarvestSummary::Completed(_) => {
            println!();
            println!(
                "Done: {} succeeded, {} failed. Files are in {}",
                summary.succeeded(),
                summary.failed(),
                target.output.display()
            );
        }
    }
    Ok(())
}
