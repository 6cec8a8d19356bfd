//! `pbdl discover <url>` – list media URLs without downloading.

use anyhow::{Context, Result};
use pbdl_core::config::PbdlConfig;
use pbdl_core::discover::{default_chain, Discoverer, MediaClass};

use super::{effective_config, open_session};
use crate::cli::console::print_banner;
use crate::cli::TargetArgs;

pub fn run_discover(cfg: &PbdlConfig, target: &TargetArgs) -> Result<()> {
    let cfg = effective_config(cfg, target);
    print_banner(&target.url, &target.output);

    // The page dump is written here.
    std::fs::create_dir_all(&target.output)
        .with_context(|| format!("create output directory {}", target.output.display()))?;

    let mut session = open_session(&cfg, target)?;
    let mut chain = default_chain(&cfg.discovery, &cfg.http, &target.output);
    let found = chain.discover(&mut session);

    if found.is_empty() {
        println!("No media URLs found.");
        println!("Check {}/presentation/ manually.", session.site_root());
        return Ok(());
    }
    for class in [MediaClass::Video, MediaClass::Audio] {
        let urls = found.set(class);
        println!("{} ({}):", class, urls.len());
        for url in urls {
            println!("  {}", url);
        }
    }
    Ok(())
}
