use crate::engine::{DEFAULT_LANGUAGE, DEFAULT_MAX_FILENAME_LEN};
use crate::media::MediaType;
use crate::probe::ProbeBackend;
use crate::template::{validate_pattern, DEFAULT_PATTERN};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pattern: String,
    pub language: String,
    pub media_type: MediaType,
    pub probe_backend: ProbeBackend,
    pub omdb_api_key: Option<String>,
    pub destination: Option<PathBuf>,
    pub max_filename_len: usize,
    pub include_hidden: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            media_type: MediaType::Movie,
            probe_backend: ProbeBackend::Auto,
            omdb_api_key: None,
            destination: None,
            max_filename_len: DEFAULT_MAX_FILENAME_LEN,
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("org", "media-renamer", "media-renamer")
        .context("could not determine the OS config directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&app_paths()?.config_path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("invalid config file: {}", path.display()))?;
    validate_pattern(&config.pattern)
        .with_context(|| format!("invalid pattern in config file: {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<PathBuf> {
    let paths = app_paths()?;
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "cannot create config directory: {}",
            paths.config_dir.display()
        )
    })?;
    save_config_to(config, &paths.config_path)?;
    Ok(paths.config_path)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    let body = toml::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(path, body)
        .with_context(|| format!("cannot write config file: {}", path.display()))?;
    Ok(())
}
