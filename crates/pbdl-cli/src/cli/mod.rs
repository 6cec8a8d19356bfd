//! CLI for the presentation playback media downloader.

mod commands;
mod console;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pbdl_core::config::{self, PbdlConfig};
use std::path::PathBuf;

use commands::{run_discover, run_fetch, run_get};

/// Top-level CLI for pbdl.
#[derive(Debug, Parser)]
#[command(name = "pbdl")]
#[command(about = "pbdl: download the video and audio behind a presentation playback page", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/pbdl/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// The page to work on and how to reach it.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Playback page URL.
    pub url: String,

    /// Username for the site's login form.
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password for the site's login form.
    #[arg(short, long)]
    pub password: Option<String>,

    /// Directory for downloaded files and the page dump.
    #[arg(short, long, default_value = "downloads", value_name = "DIR")]
    pub output: PathBuf,

    /// Try rendered-page discovery in headless Chrome first.
    #[arg(long)]
    pub browser: bool,

    /// Chrome executable for rendered-page discovery (implies --browser).
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Discover every media URL on the page and download them all.
    Fetch(TargetArgs),

    /// Only list the media URLs found on the page.
    Discover(TargetArgs),

    /// Download one URL to a file, with the same validation as `fetch`.
    Get {
        /// Media URL.
        url: String,

        /// Destination file.
        dest: PathBuf,

        /// Page sent as `Referer` (defaults to the media URL itself).
        #[arg(long, value_name = "URL")]
        referer: Option<String>,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch(target) => run_fetch(&cfg, &target)?,
            CliCommand::Discover(target) => run_discover(&cfg, &target)?,
            CliCommand::Get { url, dest, referer } => {
                run_get(&cfg, &url, &dest, referer.as_deref())?
            }
        }

        Ok(())
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<PbdlConfig> {
    match path {
        Some(p) => config::load_from_path(p),
        None => config::load_or_init(),
    }
}

#[cfg(test)]
mod tests;
