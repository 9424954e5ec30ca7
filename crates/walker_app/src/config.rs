use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use walker_core::{ControllerSettings, DEFAULT_TARGET_HOST};
use walker_engine::{WalkSettings, DEFAULT_EXPORT_PREFIX};
use walker_logging::{default_log_file, LogDestination};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "walker.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Host the active tab must be on before a walk or reset is sent.
    pub target_host: String,
    /// Where `job_state.json` lives.
    pub store_dir: PathBuf,
    pub output_dir: PathBuf,
    pub export_prefix: String,
    pub auto_export: bool,
    pub log: LogConfig,
    pub walk: WalkSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_host: DEFAULT_TARGET_HOST.to_string(),
            store_dir: PathBuf::from(".walker"),
            output_dir: PathBuf::from("output"),
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            auto_export: true,
            log: LogConfig::default(),
            walk: WalkSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub target: LogTarget,
    pub level: LogLevel,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::File,
            level: LogLevel::Info,
            file: default_log_file(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl AppConfig {
    /// Reads `path`, or `walker.ron` when present, or falls back to defaults.
    /// Also returns the file the settings came from, if any.
    ///
    /// An explicitly named file must exist. Runs before logging is set up, so
    /// the caller reports the source.
    pub fn load(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
                return Ok((Self::default(), None));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("cannot read config {}", path.display()));
            }
        };

        let config = Self::parse(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok((config, Some(path)))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            target_host: self.target_host.clone(),
            auto_export: self.auto_export,
        }
    }

    /// Tab address used when none is given on the command line.
    pub fn default_tab_url(&self) -> String {
        format!("https://{}/", self.target_host)
    }
}
