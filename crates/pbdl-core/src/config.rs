use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Transport defaults shared by every request a session makes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Identity string sent as `User-Agent`.
    pub user_agent: String,
    /// Value of the `Accept-Language` header.
    pub accept_language: String,
    /// Connect timeout in seconds for every request.
    pub connect_timeout_secs: u64,
    /// Total timeout in seconds for page fetches, probes and login requests.
    pub request_timeout_secs: u64,
    /// A download is aborted when it receives nothing for this many seconds.
    pub download_stall_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 10,
            download_stall_secs: 30,
        }
    }
}

/// Login endpoints tried in order, relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub paths: Vec<String>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            paths: vec![
                "/login".to_string(),
                "/login.php".to_string(),
                "/index.php/login".to_string(),
            ],
        }
    }
}

/// Discovery knobs (optional `[discovery]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Try rendered-page discovery in headless Chrome before static fetching.
    /// When off the rendered-page strategy is skipped entirely.
    pub browser: bool,
    /// Chrome executable; implies `browser`. Unset means `CHROME` or `$PATH` lookup.
    pub chrome_path: Option<PathBuf>,
    /// Seconds to wait after navigation before inspecting the page.
    pub settle_secs: u64,
    /// Conventional video paths probed with a ranged GET.
    pub video_probe_paths: Vec<String>,
    /// Conventional audio paths probed with a ranged GET.
    pub audio_probe_paths: Vec<String>,
    /// File name (inside the output directory) for the raw page dump.
    pub page_dump_name: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            browser: false,
            chrome_path: None,
            settle_secs: 5,
            video_probe_paths: [
                "/presentation/video.webm",
                "/presentation/video.mp4",
                "/presentation/deskshare.webm",
                "/presentation/deskshare.mp4",
                "/presentation/camera.webm",
                "/presentation/camera.mp4",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            audio_probe_paths: [
                "/presentation/audio.ogg",
                "/presentation/audio.mp3",
                "/presentation/audio.webm",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            page_dump_name: "page_source.html".to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn uses_browser(&self) -> bool {
        self.browser || self.chrome_path.is_some()
    }
}

/// Download validation (optional `[fetch]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Leading bytes of a response inspected for failure markers.
    pub sniff_bytes: usize,
    /// Tokens that mark an error body served in place of media.
    pub unsupported_markers: Vec<String>,
    /// Files smaller than this many bytes get a "suspiciously small" advisory.
    pub small_file_threshold: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            sniff_bytes: 1024,
            unsupported_markers: vec!["unsupportedRequest".to_string(), "FAILED".to_string()],
            small_file_threshold: 100,
        }
    }
}

/// Global configuration loaded from `~/.config/pbdl/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PbdlConfig {
    pub http: HttpConfig,
    pub login: LoginConfig,
    pub discovery: DiscoveryConfig,
    pub fetch: FetchConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pbdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PbdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PbdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file; missing keys take their defaults.
pub fn load_from_path(path: &Path) -> Result<PbdlConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: PbdlConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
