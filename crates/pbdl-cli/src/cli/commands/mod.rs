//! CLI command handlers, one file per subcommand.

mod discover;
mod fetch;
mod get;

pub use discover::run_discover;
pub use fetch::run_fetch;
pub use get::run_get;

use anyhow::Result;
use pbdl_core::config::PbdlConfig;
use pbdl_core::session::login::{login, Credentials, LoginOutcome};
use pbdl_core::session::Session;

use super::TargetArgs;

/// Config with command-line overrides applied.
fn effective_config(cfg: &PbdlConfig, target: &TargetArgs) -> PbdlConfig {
    let mut cfg = cfg.clone();
    if target.browser {
        cfg.discovery.browser = true;
    }
    if let Some(path) = target.chrome.as_ref() {
        cfg.discovery.chrome_path = Some(path.clone());
    }
    cfg
}

/// Open a session for the target page and log in when credentials were given.
fn open_session(cfg: &PbdlConfig, target: &TargetArgs) -> Result<Session> {
    let mut session = Session::new(&target.url, &cfg.http)?;
    let creds = Credentials::from_parts(target.username.clone(), target.password.clone());
    if let Some(creds) = creds {
        println!("Logging in as {}...", creds.username);
        match login(&mut session, &creds, &cfg.login.paths) {
            LoginOutcome::Accepted { endpoint, status } => {
                println!("Login accepted by {} (HTTP {})", endpoint, status)
            }
            LoginOutcome::Failed => println!("Login failed, continuing without authentication"),
        }
    }
    Ok(session)
}
