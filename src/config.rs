use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ObscuraError, ObscuraResult};
use crate::overlay::types::DEFAULT_PADDING;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme + host + port of the analysis service, no trailing path.
    /// Overridden by `OBSCURA_API_BASE`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_path")]
    pub image_path: String,
    /// No timeout when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            image_path: default_image_path(),
            timeout_secs: None,
        }
    }
}

impl ApiConfig {
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.image_path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Pixels added around every projected box.
    #[serde(default = "default_padding")]
    pub padding: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            padding: default_padding(),
        }
    }
}

/// The Android emulator reaches the host loopback through 10.0.2.2.
fn default_base_url() -> String {
    if cfg!(target_os = "android") {
        "http://10.0.2.2:8080".to_string()
    } else {
        "http://localhost:8080".to_string()
    }
}

fn default_image_path() -> String {
    "/analyze/image".to_string()
}

fn default_padding() -> f64 {
    DEFAULT_PADDING
}

/// Directories searched for `config.toml`, in priority order: next to the
/// executable, the working directory, then the user config directory.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs_list = Vec::new();
    if let Some(parent) = std::env::current_exe().ok().and_then(|e| e.parent().map(Path::to_path_buf)) {
        dirs_list.push(parent);
    }
    if let Ok(cwd) = std::env::current_dir() {
        dirs_list.push(cwd);
    }
    if let Some(dir) = dirs::config_dir() {
        dirs_list.push(dir.join("obscura"));
    }
    dirs_list
}

fn resolve_config_path(search: &[PathBuf]) -> ObscuraResult<PathBuf> {
    for dir in search {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found");
            return Ok(candidate);
        }
    }
    Err(ObscuraError::Config(
        "config.toml not found next to executable, in working directory or user config directory"
            .into(),
    ))
}

pub fn load_config_in(search: &[PathBuf]) -> ObscuraResult<AppConfig> {
    let path = resolve_config_path(search)?;
    load_config_from(&path)
}

/// Like [`load_config_in`], but a missing or unreadable file yields the
/// defaults (with environment overrides) instead of an error.
pub fn load_config_or_default(search: &[PathBuf]) -> AppConfig {
    match load_config_in(search) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "no usable config; using defaults");
            let mut cfg = AppConfig::default();
            apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

/// Parse `path` and apply environment overrides.
pub fn load_config_from(path: &Path) -> ObscuraResult<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config: AppConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config);
    validate(&config)?;
    tracing::info!(path = %path.display(), endpoint = %config.api.endpoint_url(), "config loaded");
    Ok(config)
}

pub fn save_config(config: &AppConfig, path: &Path) -> ObscuraResult<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(base) = std::env::var("OBSCURA_API_BASE") {
        if !base.trim().is_empty() {
            tracing::debug!(base = %base, "api base overridden from environment");
            config.api.base_url = base.trim().to_string();
        }
    }
}

pub fn validate(config: &AppConfig) -> ObscuraResult<()> {
    let base = &config.api.base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ObscuraError::Config(format!(
            "api.base_url must be an http(s) URL, got '{base}'"
        )));
    }
    if !config.overlay.padding.is_finite() {
        return Err(ObscuraError::Config("overlay.padding must be finite".into()));
    }
    Ok(())
}

/// Serialises tests that touch process environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
