use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analytics::DEFAULT_CURRENT_WINDOW_MINUTES;
use crate::listeners::geo::{DEFAULT_GEO_TIMEOUT, DEFAULT_GEO_URL};

const DEFAULT_PORT: u16 = 10000;
const DEFAULT_MEDIA_DIR: &str = "static/library";
const DEFAULT_LOG_FILE: &str = "listeners.json";
/// One week; longer windows are ignored in favour of the default.
const MAX_WINDOW_MINUTES: i64 = 7 * 24 * 60;

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub media_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub localhost: Option<bool>,
    pub geo_url: Option<String>,
    pub geo_timeout_ms: Option<u64>,
    pub geo_enabled: Option<bool>,
    pub current_window_minutes: Option<i64>,
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub media_dir: PathBuf,
    pub log_file: PathBuf,
    pub localhost: bool,
    pub geo_url: String,
    pub geo_timeout: Duration,
    pub geo_enabled: bool,
    pub current_window: chrono::Duration,
}

impl Config {
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Self {
        let file = file.unwrap_or_default();
        let window_minutes = file
            .current_window_minutes
            .filter(|m| (1..=MAX_WINDOW_MINUTES).contains(m))
            .unwrap_or(DEFAULT_CURRENT_WINDOW_MINUTES);
        Config {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            media_dir: args
                .media_dir
                .clone()
                .or(file.media_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_DIR)),
            log_file: args
                .log_file
                .clone()
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            localhost: args.localhost || file.localhost.unwrap_or(false),
            geo_url: args
                .geo_url
                .clone()
                .or(file.geo_url)
                .unwrap_or_else(|| DEFAULT_GEO_URL.to_string()),
            geo_timeout: file
                .geo_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_GEO_TIMEOUT),
            geo_enabled: !args.no_geo && file.geo_enabled.unwrap_or(true),
            current_window: chrono::Duration::minutes(window_minutes),
        }
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("loopcast.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("loopcast").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
