use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default object-storage host suffix recognized as a signed download host.
pub const DEFAULT_STORAGE_DOMAIN: &str = "aliyundrive.net";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Header-only liveness probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum probes in flight at once.
    pub workers: usize,
    pub user_agent: String,
    pub follow_redirects: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 5,
            workers: 8,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            follow_redirects: true,
        }
    }
}

/// Minting endpoint used to re-issue expired links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Base URL; a link's original query parameters are replayed against it.
    pub endpoint: String,
    #[serde(default = "default_refresh_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_refresh_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Capture-side persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// fsync the exchange log after every appended record.
    pub sync_each_append: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sync_each_append: true,
        }
    }
}

/// Global configuration loaded from `~/.config/linkcap/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkcapConfig {
    /// Where capture sessions are written and read. Defaults to the XDG state dir.
    pub session_dir: Option<PathBuf>,
    /// Host suffix that admits a URL as a signed download link.
    pub storage_domain: String,
    pub probe: ProbeConfig,
    pub capture: CaptureConfig,
    /// Optional; without it expired links are reported but not refreshed.
    pub refresh: Option<RefreshConfig>,
}

impl Default for LinkcapConfig {
    fn default() -> Self {
        Self {
            session_dir: None,
            storage_domain: DEFAULT_STORAGE_DOMAIN.to_string(),
            probe: ProbeConfig::default(),
            capture: CaptureConfig::default(),
            refresh: None,
        }
    }
}

impl LinkcapConfig {
    /// Configured session directory, or `~/.local/state/linkcap/sessions`.
    pub fn session_dir(&self) -> Result<PathBuf> {
        match &self.session_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let xdg_dirs = xdg::BaseDirectories::with_prefix("linkcap")?;
                Ok(xdg_dirs.create_state_directory("sessions")?)
            }
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("linkcap")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LinkcapConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LinkcapConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: LinkcapConfig = toml::from_str(&data)?;
    Ok(cfg)
}
