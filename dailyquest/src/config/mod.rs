//! Configuration system for `DailyQuest`.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/dailyquest/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};

use dailyquest_model::progress::LevelPolicy;

use crate::cli::Command;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    store: StoreFileConfig,
    progress: ProgressFileConfig,
    display: DisplayFileConfig,
}

/// `[store]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreFileConfig {
    data_file: Option<PathBuf>,
}

/// `[progress]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ProgressFileConfig {
    level_policy: Option<LevelPolicy>,
}

/// `[display]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct DisplayFileConfig {
    date_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// JSON data file holding quests and the profile.
    pub data_file: PathBuf,
    /// How many level-ups a single completion may trigger.
    pub level_policy: LevelPolicy,
    /// Date display format string (chrono).
    pub date_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            level_policy: LevelPolicy::Cascade,
            date_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read,
    /// or if any config file that exists cannot be parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve an `AppConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            data_file: cli
                .data_file
                .clone()
                .or_else(|| file.store.data_file.clone())
                .unwrap_or(defaults.data_file),
            level_policy: cli
                .level_policy
                .or(file.progress.level_policy)
                .unwrap_or(defaults.level_policy),
            date_format: file
                .display
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Quest-style to-do tracker with daily missions")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/dailyquest/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the JSON data file.
    #[arg(long, global = true, env = "DAILYQUEST_DATA")]
    pub data_file: Option<PathBuf>,

    /// Level-up behaviour when one completion crosses several thresholds
    /// (cascade, single-step).
    #[arg(long, global = true, env = "DAILYQUEST_LEVEL_POLICY")]
    pub level_policy: Option<LevelPolicy>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info", env = "DAILYQUEST_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/dailyquest.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Command to run (default: `home`).
    #[command(subcommand)]
    pub command: Option<Command>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Default data file location: the platform data dir, or the working
/// directory when none is known.
fn default_data_file() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("dailyquest.json"),
        |dir| dir.join("dailyquest").join("quests.json"),
    )
}

/// Where to look for the config file, and whether it has to exist.
///
/// An explicit `--config` path is required. The default location is
/// optional, and there is none on platforms without a config dir.
fn config_file_location(explicit_path: Option<&Path>) -> Option<(PathBuf, bool)> {
    match explicit_path {
        Some(path) => Some((path.to_path_buf(), true)),
        None => dirs::config_dir().map(|dir| (dir.join("dailyquest").join("config.toml"), false)),
    }
}

/// Read and parse the TOML config file, falling back to an empty config
/// when the optional default file is absent.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let Some((path, required)) = config_file_location(explicit_path) else {
        return Ok(ConfigFile::default());
    };
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ConfigFile::default());
        }
        Err(source) => return Err(ConfigError::ReadFile { path, source }),
    };
    Ok(toml::from_str(&contents)?)
}
