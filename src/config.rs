use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Root of the local photo tree, used when no directory is given on the
    /// command line.
    #[serde(default)]
    pub local_photos_dir: Option<PathBuf>,

    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub compare: CompareConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_media_extensions")]
    pub media_extensions: Vec<String>,

    /// Skip files and directories whose name starts with a dot.
    #[serde(default = "default_skip_hidden")]
    pub skip_hidden: bool,
}

fn default_skip_hidden() -> bool {
    true
}

fn default_media_extensions() -> Vec<String> {
    [
        // Images
        "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "heic",
        // Videos
        "mp4", "mov", "avi", "wmv", "flv", "webm",
    ]
    .iter()
    .map(|e| e.to_string())
    .collect()
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            media_extensions: default_media_extensions(),
            skip_hidden: default_skip_hidden(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_endpoint")]
    pub endpoint: String,

    /// Bearer token used as-is. Takes precedence over `token_path`.
    #[serde(default)]
    pub access_token: Option<String>,

    /// JSON token file written by an external authorization flow.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_album_page_size")]
    pub album_page_size: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_remote_endpoint() -> String {
    "https://photoslibrary.googleapis.com/v1".to_string()
}

fn default_token_path() -> PathBuf {
    Config::config_dir().join("token.json")
}

fn default_page_size() -> u32 {
    100
}

fn default_album_page_size() -> u32 {
    50
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_remote_endpoint(),
            access_token: None,
            token_path: default_token_path(),
            page_size: default_page_size(),
            album_page_size: default_album_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Treat albums whose local and remote member counts are equal as in
    /// sync without a per-photo diff. Equal counts do not guarantee equal
    /// members.
    #[serde(default = "default_skip_equal_counts")]
    pub skip_equal_counts: bool,
}

fn default_skip_equal_counts() -> bool {
    true
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            skip_equal_counts: default_skip_equal_counts(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photo-organizer")
        .join("photos.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            local_photos_dir: None,
            scanner: ScannerConfig::default(),
            remote: RemoteConfig::default(),
            compare: CompareConfig::default(),
        }
    }
}

impl Config {
    /// Load the config from `PHOTO_ORGANIZER_CONFIG` or the default location,
    /// writing a default file when none exists yet.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os("PHOTO_ORGANIZER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photo-organizer")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
