//! Configuration system for swarmdeck.
//!
//! Provides layered configuration from multiple sources:
//!
//! 1. **Compiled defaults** - Built into the binary
//! 2. **User config file** - `~/.config/swarmdeck/config.toml` (or `--config`)
//! 3. **Environment variables** - `SWARMDECK_*` prefix, plus `NO_COLOR`
//! 4. **CLI arguments** - Highest priority, always wins
//!
//! A leading `~` in `[paths]` entries expands to the home directory.
//!
//! # Example Configuration File
//!
//! ```toml
//! [paths]
//! table = "~/campaigns/swarms.csv"
//! logo = "~/campaigns/lbc_logo.png"
//!
//! [report]
//! header = "LBC Swarm Campaign Report"
//! footer = "Private and Confidential"
//! chart_color = "darkorange"
//! include_comments = true
//!
//! [output]
//! format = "text"
//! colors = true
//! ```

use crate::error::{Result, SwarmError};
use crate::report::{DEFAULT_CHART_COLOR, DEFAULT_FOOTER, DEFAULT_HEADER, ReportOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure for swarmdeck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub report: ReportConfig,
    pub output: OutputConfig,
}

/// File locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Swarm table.
    /// Environment variable: `SWARMDECK_TABLE`
    pub table: Option<PathBuf>,

    /// Logo image placed on the report cover.
    /// Environment variable: `SWARMDECK_LOGO`
    pub logo: Option<PathBuf>,
}

/// Report presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Running header on every page.
    /// Environment variable: `SWARMDECK_HEADER`
    pub header: String,

    /// Running footer on every page.
    /// Environment variable: `SWARMDECK_FOOTER`
    pub footer: String,

    /// Bar fill colour for every chart.
    pub chart_color: String,

    /// Answer to the comments prompt; unset means ask.
    pub include_comments: Option<bool>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format: text, json, json-pretty.
    /// Environment variable: `SWARMDECK_FORMAT`
    pub format: String,

    /// Enable colored output.
    pub colors: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            footer: DEFAULT_FOOTER.to_string(),
            chart_color: DEFAULT_CHART_COLOR.to_string(),
            include_comments: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            colors: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// An explicit `path` must exist and parse; the standard user file is
    /// optional and skipped with a warning when broken.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::ConfigError`] when the explicit file cannot be
    /// read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        match path {
            Some(path) => config.merge(Self::parse_file(path)?),
            None => {
                if let Some(user_config) = Self::user_config_path()
                    .as_deref()
                    .and_then(Self::load_from_file)
                {
                    config.merge(user_config);
                }
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());

        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Load a config file if present; parse failures are logged and ignored.
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            debug!("Config file not found: {}", path.display());
            return None;
        }

        match Self::parse_file(path) {
            Ok(config) => {
                info!("Loaded config from: {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    /// Read and parse one config file.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::ConfigError`] on read or TOML errors.
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SwarmError::ConfigError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| SwarmError::ConfigError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the path to the user configuration file.
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("swarmdeck").join("config.toml"))
    }

    /// Apply environment overrides read through `var`.
    fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(table) = var("SWARMDECK_TABLE") {
            self.paths.table = Some(PathBuf::from(table));
        }
        if let Some(logo) = var("SWARMDECK_LOGO") {
            self.paths.logo = Some(PathBuf::from(logo));
        }
        if let Some(header) = var("SWARMDECK_HEADER") {
            self.report.header = header;
        }
        if let Some(footer) = var("SWARMDECK_FOOTER") {
            self.report.footer = footer;
        }
        if let Some(format) = var("SWARMDECK_FORMAT") {
            self.output.format = format;
        }
        if var("NO_COLOR").is_some() {
            self.output.colors = false;
        }
    }

    /// Merge another config into this one (other takes precedence).
    fn merge(&mut self, other: Self) {
        if other.paths.table.is_some() {
            self.paths.table = other.paths.table;
        }
        if other.paths.logo.is_some() {
            self.paths.logo = other.paths.logo;
        }

        self.report.header = other.report.header;
        self.report.footer = other.report.footer;
        self.report.chart_color = other.report.chart_color;
        if other.report.include_comments.is_some() {
            self.report.include_comments = other.report.include_comments;
        }

        self.output.format = other.output.format;
        self.output.colors = other.output.colors;
    }

    /// Table path, falling back to the per-user data directory.
    #[must_use]
    pub fn table_path(&self) -> PathBuf {
        self.paths
            .table
            .as_deref()
            .map_or_else(crate::default_table_path, expand_home)
    }

    /// Report options for `output` with configured presentation applied.
    ///
    /// Blank header or footer text disables that running line.
    #[must_use]
    pub fn report_options(&self, output: &Path) -> ReportOptions {
        let non_blank = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        ReportOptions {
            header: non_blank(&self.report.header),
            footer: non_blank(&self.report.footer),
            logo: self.paths.logo.as_deref().map(expand_home),
            chart_color: self.report.chart_color.clone(),
            include_comments: self.report.include_comments.unwrap_or(false),
            ..ReportOptions::for_output(output)
        }
    }

    /// Save the current configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SwarmError::path_error("create directory", parent, e))?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| SwarmError::ConfigError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        std::fs::write(path, content).map_err(|e| SwarmError::path_error("write", path, e))?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }
}

/// Expand a leading `~` to the home directory.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    expand_home_with(path, dirs::home_dir().as_deref())
}

fn expand_home_with(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
