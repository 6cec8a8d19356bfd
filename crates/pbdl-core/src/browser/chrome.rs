//! Headless Chrome over the DevTools protocol.
//!
//! Each connection launches its own Chrome process with a single tab that
//! records every `Network.responseReceived` from the moment it opens. The
//! process is killed when the `ChromeBrowser` is dropped.

use headless_chrome::{Browser as Chrome, LaunchOptions, Tab};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::HttpConfig;

use super::{Browser, BrowserConnector, BrowserError, NetworkEntry};

const RESPONSE_HANDLER: &str = "pbdl-responses";

fn chrome_error(e: anyhow::Error) -> BrowserError {
    BrowserError::Chrome(format!("{:#}", e))
}

/// Launches `ChromeBrowser` sessions.
#[derive(Debug, Clone)]
pub struct ChromeConnector {
    chrome_path: Option<PathBuf>,
    idle_timeout: Duration,
}

impl ChromeConnector {
    /// `chrome_path` overrides the executable lookup (`CHROME` env var, then `$PATH`).
    /// Page loads can be slow, so the idle limit is wider than a plain request.
    pub fn new(chrome_path: Option<PathBuf>, http: &HttpConfig) -> Self {
        Self {
            chrome_path,
            idle_timeout: Duration::from_secs(http.request_timeout_secs.max(1) * 6),
        }
    }

    pub fn chrome_path(&self) -> Option<&PathBuf> {
        self.chrome_path.as_ref()
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, BrowserError> {
        LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some((1920, 1080)))
            .path(self.chrome_path.clone())
            .idle_browser_timeout(self.idle_timeout)
            .build()
            .map_err(|e| BrowserError::Unavailable(e.to_string()))
    }
}

impl BrowserConnector for ChromeConnector {
    type Browser = ChromeBrowser;

    fn connect(&self) -> Result<ChromeBrowser, BrowserError> {
        let chrome = Chrome::new(self.launch_options()?)
            .map_err(|e| BrowserError::Unavailable(format!("{:#}", e)))?;
        let tab = chrome.new_tab().map_err(chrome_error)?;

        let responses = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&responses);
        tab.register_response_handling(
            RESPONSE_HANDLER,
            Box::new(move |event, _fetch_body| {
                if let Ok(mut entries) = sink.lock() {
                    entries.push(NetworkEntry::from(&event));
                }
            }),
        )
        .map_err(chrome_error)?;

        tracing::debug!(chrome = ?self.chrome_path, "headless chrome started");
        Ok(ChromeBrowser {
            tab,
            responses,
            _chrome: chrome,
        })
    }
}

/// One Chrome process and its tab.
pub struct ChromeBrowser {
    tab: Arc<Tab>,
    responses: Arc<Mutex<Vec<NetworkEntry>>>,
    // Declared last: the tab goes before the process.
    _chrome: Chrome,
}

impl Browser for ChromeBrowser {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(chrome_error)?;
        Ok(())
    }

    fn element_properties(
        &mut self,
        tag: &str,
        property: &str,
    ) -> Result<Vec<String>, BrowserError> {
        let elements = self.tab.find_elements(tag).map_err(chrome_error)?;
        let getter = property_getter(property);

        let mut values = Vec::new();
        for element in elements {
            match element.call_js_fn(&getter, vec![], false) {
                Ok(object) => {
                    if let Some(Value::String(s)) = object.value {
                        if !s.is_empty() {
                            values.push(s);
                        }
                    }
                }
                // Elements can be detached between the lookup and the read.
                Err(e) => tracing::debug!(tag, "property read failed: {:#}", e),
            }
        }
        Ok(values)
    }

    fn execute_script(&mut self, script: &str) -> Result<Value, BrowserError> {
        let object = self
            .tab
            .evaluate(&json_expression(script), false)
            .map_err(chrome_error)?;
        match object.value {
            Some(Value::String(json)) => Ok(serde_json::from_str(&json)?),
            _ => Ok(Value::Null),
        }
    }

    fn network_log(&mut self) -> Result<Vec<NetworkEntry>, BrowserError> {
        let mut entries = self
            .responses
            .lock()
            .map_err(|_| BrowserError::Chrome("response log poisoned".to_string()))?;
        Ok(std::mem::take(&mut *entries))
    }
}

/// JS function returning `this[property]` as a string, empty when unset.
fn property_getter(property: &str) -> String {
    format!(
        "function() {{ var v = this[{}]; return v ? String(v) : ''; }}",
        Value::String(property.to_string())
    )
}

/// Wrap a function body so its return value comes back as a JSON string.
fn json_expression(script: &str) -> String {
    format!("JSON.stringify((function() {{ {} }})())", script)
}
