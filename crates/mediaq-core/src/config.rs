use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Settings for the external extraction engine (yt-dlp).
///
/// These feed the per-type default option set; they must not change between
/// the probe and the transfer of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine executable, resolved through `PATH` when not absolute.
    pub binary: String,
    /// Arguments placed before everything else, e.g. `["-m", "yt_dlp"]` with `binary = "python3"`.
    #[serde(default)]
    pub binary_args: Vec<String>,
    /// User-Agent sent with every engine request.
    pub user_agent: String,
    /// Output template relative to the download directory.
    pub output_template: String,
    /// Extra `Name: value` headers sent with every request.
    #[serde(default)]
    pub extra_headers: Vec<String>,
    /// Target codec for audio jobs.
    pub audio_format: String,
    /// Target quality for audio jobs (e.g. "320K" or "0").
    pub audio_quality: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            binary_args: Vec::new(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"
                .to_string(),
            output_template: "%(title).150B [%(id)s].%(ext)s".to_string(),
            extra_headers: vec!["Accept-Language: ja-JP".to_string()],
            audio_format: "mp3".to_string(),
            audio_quality: "320K".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/mediaq/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaqConfig {
    /// Directory finished media is written to. Defaults to `~/.local/share/mediaq/downloads`.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Optional path of the job database. Defaults to `~/.local/state/mediaq/jobs.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl MediaqConfig {
    /// Download directory from config, or the XDG data default.
    pub fn resolved_download_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.download_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("mediaq")?;
        Ok(xdg_dirs.get_data_home().join("mediaq").join("downloads"))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mediaq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MediaqConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MediaqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)
            .with_context(|| format!("write default config {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: MediaqConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
