//! Optional browser automation used by the rendered-page discovery strategy.
//!
//! The discovery code only depends on the `Browser`/`BrowserConnector`
//! traits; `chrome` provides the one real implementation, a headless Chrome
//! driven over the DevTools protocol.

pub mod chrome;
mod network;

pub use chrome::{ChromeBrowser, ChromeConnector};
pub use network::NetworkEntry;

/// Failure of a single browser operation. Discovery swallows these; they
/// are only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// Chrome could not be configured or launched.
    #[error("browser unavailable: {0}")]
    Unavailable(String),
    /// A DevTools call failed.
    #[error("chrome: {0}")]
    Chrome(String),
    #[error("script result: {0}")]
    Json(#[from] serde_json::Error),
}

/// A live, controllable browser session.
pub trait Browser {
    /// Load `url` and return once navigation finished.
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Value of `property` (resolved, like `element.src`) for every element with tag `tag`.
    /// Elements without the property are skipped.
    fn element_properties(&mut self, tag: &str, property: &str)
        -> Result<Vec<String>, BrowserError>;

    /// Run `script` (a function body) in the page and return its JSON result.
    fn execute_script(&mut self, script: &str) -> Result<serde_json::Value, BrowserError>;

    /// Drain the network responses captured since the last call.
    fn network_log(&mut self) -> Result<Vec<NetworkEntry>, BrowserError>;
}

/// Opens browser sessions on demand.
pub trait BrowserConnector {
    type Browser: Browser;

    fn connect(&self) -> Result<Self::Browser, BrowserError>;
}
