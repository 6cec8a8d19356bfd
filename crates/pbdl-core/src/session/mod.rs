//! HTTP session bound to one playback page.
//!
//! Wraps a single reused libcurl easy handle so the in-memory cookie engine
//! carries login cookies across every request of a run. All calls block the
//! current thread; each is bounded by the timeouts in `HttpConfig`.

mod headers;
pub mod login;

pub use headers::ResponseHead;

use anyhow::{Context, Result};
use crate::config::HttpConfig;
use std::cell::{Cell, RefCell};
use std::time::Duration;
use url::Url;

/// Body of a page or auxiliary resource, decoded leniently as UTF-8.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub head: ResponseHead,
    pub body: String,
}

/// How long a request may take before libcurl gives up.
#[derive(Debug, Clone, Copy)]
enum Limit {
    /// Hard wall-clock limit for small requests.
    Total(Duration),
    /// Abort only when the transfer stalls (below 1 byte/s for the window).
    Stall(Duration),
}

pub struct Session {
    easy: curl::easy::Easy,
    page_url: Url,
    http: HttpConfig,
}

impl Session {
    /// Create a session for the playback page at `page_url` (trailing slashes are dropped).
    pub fn new(page_url: &str, http: &HttpConfig) -> Result<Self> {
        let trimmed = page_url.trim().trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).with_context(|| format!("invalid page URL: {}", page_url))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("unsupported URL scheme: {}", parsed.scheme());
        }
        Ok(Self {
            easy: curl::easy::Easy::new(),
            page_url: parsed,
            http: http.clone(),
        })
    }

    /// The playback page this session was opened for; also the `Referer` of every request.
    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Everything before `/playback` in the page URL, or the bare origin when
    /// the page does not live under `/playback`.
    pub fn site_root(&self) -> String {
        let origin = self.page_url.origin().ascii_serialization();
        match self.page_url.path().find("/playback") {
            Some(i) => format!("{}{}", origin, &self.page_url.path()[..i]),
            None => origin,
        }
    }

    pub fn http_config(&self) -> &HttpConfig {
        &self.http
    }

    /// GET `url` and return the status, headers and body text regardless of status.
    pub fn get_text(&mut self, url: &str) -> Result<TextResponse> {
        let limit = Limit::Total(self.request_timeout());
        self.prepare(url, limit).context("configure GET")?;
        self.easy.accept_encoding("")?;

        let mut lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();
        {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|data| {
                lines.push(String::from_utf8_lossy(data).trim_end().to_string());
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer
                .perform()
                .with_context(|| format!("GET {} failed", url))?;
        }

        Ok(TextResponse {
            head: headers::parse_head(&lines),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    /// Ranged GET for the first `window` bytes of `url`, returning only the head.
    ///
    /// Servers that ignore `Range` would send the whole file; the transfer is
    /// cut once more than `window` bytes arrive.
    pub fn probe(&mut self, url: &str, window: u64) -> Result<ResponseHead> {
        let limit = Limit::Total(self.request_timeout());
        self.prepare(url, limit).context("configure probe")?;
        self.easy
            .range(&format!("0-{}", window.saturating_sub(1)))?;

        let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let received = Cell::new(0u64);
        let cut_short = Cell::new(false);
        {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|data| {
                lines
                    .borrow_mut()
                    .push(String::from_utf8_lossy(data).trim_end().to_string());
                true
            })?;
            transfer.write_function(|data| {
                received.set(received.get() + data.len() as u64);
                if received.get() > window {
                    cut_short.set(true);
                    return Ok(0);
                }
                Ok(data.len())
            })?;
            match transfer.perform() {
                Ok(()) => {}
                Err(e) if cut_short.get() && e.is_write_error() => {}
                Err(e) => return Err(e).with_context(|| format!("probe {} failed", url)),
            }
        }

        Ok(headers::parse_head(&lines.into_inner()))
    }

    /// POST urlencoded `fields` to `url`, following redirects.
    pub fn post_form(&mut self, url: &str, fields: &[(&str, &str)]) -> Result<ResponseHead> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();

        let limit = Limit::Total(self.request_timeout());
        self.prepare(url, limit).context("configure POST")?;
        self.easy.post(true)?;
        self.easy.post_fields_copy(body.as_bytes())?;

        let mut lines: Vec<String> = Vec::new();
        {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|data| {
                lines.push(String::from_utf8_lossy(data).trim_end().to_string());
                true
            })?;
            transfer.write_function(|data| Ok(data.len()))?;
            transfer
                .perform()
                .with_context(|| format!("POST {} failed", url))?;
        }

        Ok(headers::parse_head(&lines))
    }

    /// Stream the body of `url`, handing every received chunk to `on_chunk`
    /// together with the final response head. Returning `false` from the
    /// callback aborts the transfer (surfacing as a curl write error).
    pub fn stream<F>(&mut self, url: &str, mut on_chunk: F) -> Result<ResponseHead, curl::Error>
    where
        F: FnMut(&ResponseHead, &[u8]) -> bool,
    {
        let limit = Limit::Stall(Duration::from_secs(self.http.download_stall_secs));
        self.prepare(url, limit)?;

        let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let head: RefCell<Option<ResponseHead>> = RefCell::new(None);
        {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|data| {
                lines
                    .borrow_mut()
                    .push(String::from_utf8_lossy(data).trim_end().to_string());
                true
            })?;
            transfer.write_function(|data| {
                let mut cached = head.borrow_mut();
                let current =
                    cached.get_or_insert_with(|| headers::parse_head(&lines.borrow()));
                if on_chunk(current, data) {
                    Ok(data.len())
                } else {
                    Ok(0)
                }
            })?;
            transfer.perform()?;
        }

        Ok(headers::parse_head(&lines.into_inner()))
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    /// Reset per-request options on the shared handle and apply session defaults.
    /// `reset` keeps the cookie store, so login cookies survive.
    fn prepare(&mut self, url: &str, limit: Limit) -> Result<(), curl::Error> {
        self.easy.reset();
        self.easy.url(url)?;
        self.easy.cookie_file("")?;
        self.easy.follow_location(true)?;
        self.easy.max_redirections(10)?;
        self.easy.useragent(&self.http.user_agent)?;
        self.easy
            .connect_timeout(Duration::from_secs(self.http.connect_timeout_secs))?;
        match limit {
            Limit::Total(d) => self.easy.timeout(d)?,
            Limit::Stall(d) => {
                self.easy.low_speed_limit(1)?;
                self.easy.low_speed_time(d)?;
            }
        }

        let mut list = curl::easy::List::new();
        list.append("Accept: */*")?;
        list.append(&format!("Accept-Language: {}", self.http.accept_language))?;
        list.append(&format!("Referer: {}", self.page_url.as_str()))?;
        self.easy.http_headers(list)?;
        Ok(())
    }
}
