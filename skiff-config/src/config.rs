//! Core `Config` struct, persistence, and path helpers.
//!
//! The config file is YAML at `~/.config/skiff/config.yaml`. Raw text is run
//! through environment-variable substitution before deserialization, so every
//! string-typed field supports `${VAR}` and `${VAR:-default}` syntax.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for the browser tab and session core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // ========================================================================
    // Tabs
    // ========================================================================
    /// Maximum number of open tabs across both partitions (0 = unlimited)
    #[serde(default = "crate::defaults::max_tabs")]
    pub max_tabs: usize,

    /// Select the opener tab (if still open) when the selected tab closes
    #[serde(default = "crate::defaults::select_parent_on_close")]
    pub select_parent_on_close: bool,

    /// Number of closed tabs kept for reopen, per partition
    #[serde(default = "crate::defaults::recently_closed_capacity")]
    pub recently_closed_capacity: usize,

    // ========================================================================
    // Session
    // ========================================================================
    /// Seconds between automatic session snapshots (0 = disabled)
    #[serde(default = "crate::defaults::session_autosave_secs")]
    pub session_autosave_secs: u64,

    /// Override for the data directory holding session and screenshot files.
    /// Supports a leading `~`. None = platform default.
    #[serde(default = "crate::defaults::data_dir")]
    pub data_dir: Option<String>,

    // ========================================================================
    // Screenshots
    // ========================================================================
    /// Number of decoded tab screenshots kept in memory (0 = disk only)
    #[serde(default = "crate::defaults::screenshot_cache_entries")]
    pub screenshot_cache_entries: usize,

    // ========================================================================
    // Navigation
    // ========================================================================
    /// URL loaded into newly created tabs when no URL is given (None = blank)
    #[serde(default = "crate::defaults::new_tab_url")]
    pub new_tab_url: Option<String>,

    /// Host recognised for universal links, e.g. `https://<app_host>/space/<id>`
    #[serde(default = "crate::defaults::app_host")]
    pub app_host: String,

    /// Search URL template; `{query}` is replaced with the percent-escaped query
    #[serde(default = "crate::defaults::search_url_template")]
    pub search_url_template: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tabs: crate::defaults::max_tabs(),
            select_parent_on_close: crate::defaults::select_parent_on_close(),
            recently_closed_capacity: crate::defaults::recently_closed_capacity(),
            session_autosave_secs: crate::defaults::session_autosave_secs(),
            data_dir: crate::defaults::data_dir(),
            screenshot_cache_entries: crate::defaults::screenshot_cache_entries(),
            new_tab_url: crate::defaults::new_tab_url(),
            app_host: crate::defaults::app_host(),
            search_url_template: crate::defaults::search_url_template(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// If the file does not exist, a default config is written there so users
    /// have something to edit. Parse and validation failures return an error;
    /// callers that must start anyway should fall back to `Config::default()`.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        log::info!("No config file found, creating default at {:?}", config_path);
        let config = Self::default();
        if let Err(e) = config.save() {
            log::error!("Failed to save default config: {e}");
        }
        Ok(config)
    }

    /// Load and validate configuration from a specific file path.
    ///
    /// A missing file yields the defaults without writing anything.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let substituted = crate::env_vars::substitute_variables(&contents);
        let config: Config = serde_yaml_ng::from_str(&substituted)
            .map_err(ConfigError::Parse)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default config file location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file path.
    ///
    /// The write is atomic: YAML is written to a sibling `.tmp` file which is
    /// then renamed over the destination.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let yaml =
            serde_yaml_ng::to_string(self).context("Failed to serialize config to YAML")?;

        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)
            .with_context(|| format!("Failed to write config file {:?}", temp_path))?;
        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to move config file into place at {:?}", path))?;

        log::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Check field values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_host.is_empty() || self.app_host.contains('/') {
            return Err(ConfigError::Validation(format!(
                "app_host must be a bare host name, got {:?}",
                self.app_host
            )));
        }

        if !self.search_url_template.contains("{query}") {
            return Err(ConfigError::Validation(format!(
                "search_url_template must contain a {{query}} placeholder, got {:?}",
                self.search_url_template
            )));
        }
        let probe = self.search_url_template.replace("{query}", "probe");
        if url::Url::parse(&probe).is_err() {
            return Err(ConfigError::Validation(format!(
                "search_url_template is not a valid URL: {:?}",
                self.search_url_template
            )));
        }

        if let Some(raw) = &self.new_tab_url
            && url::Url::parse(raw).is_err()
        {
            return Err(ConfigError::Validation(format!(
                "new_tab_url is not a valid URL: {:?}",
                raw
            )));
        }

        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("skiff")
        }
        #[cfg(not(target_os = "windows"))]
        {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
                .join("skiff")
        }
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Get the platform default data directory (no override applied).
    pub fn default_data_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("skiff")
        }
        #[cfg(not(target_os = "windows"))]
        {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
                .join("skiff")
        }
    }

    /// Resolve the data directory, honouring the `data_dir` override.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(raw) => expand_tilde(raw),
            None => Self::default_data_dir(),
        }
    }

    /// Directory holding tab screenshot blobs.
    pub fn screenshot_dir(&self) -> PathBuf {
        self.data_dir().join("screenshots")
    }
}

/// Expand a leading `~` or `~/` to the user's home directory.
fn expand_tilde(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest);
    }
    PathBuf::from(raw)
}
