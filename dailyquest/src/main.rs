//! `DailyQuest`: quest-style to-do tracker.
//!
//! Every invocation opens the data file, clears yesterday's daily missions,
//! runs one command and exits. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/dailyquest/config.toml`).
//!
//! ```bash
//! # Dashboard with level and today's missions
//! cargo run --bin dailyquest
//!
//! # Add a quest and pick it as a daily mission
//! cargo run --bin dailyquest -- add "Read 20 pages" -p 2 -d easy
//! cargo run --bin dailyquest -- daily 0192
//!
//! # Use a scratch data file
//! DAILYQUEST_DATA=/tmp/quests.json cargo run --bin dailyquest -- stats
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use dailyquest::cli::{self, CliError, Command};
use dailyquest::config::{AppConfig, CliArgs};
use dailyquest::quests::QuestManager;
use dailyquest::store::JsonFileStore;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match AppConfig::load(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            AppConfig {
                data_file: args
                    .data_file
                    .clone()
                    .unwrap_or_else(|| AppConfig::default().data_file),
                level_policy: args.level_policy.unwrap_or_default(),
                ..AppConfig::default()
            }
        }
    };

    let _log_guard = init_logging(&args.log_level, args.log_file.as_deref());

    tracing::info!(data_file = %config.data_file.display(), "dailyquest starting");

    let store = JsonFileStore::new(&config.data_file);
    let mut manager = match QuestManager::open(store, config.level_policy) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "failed to open quest data");
            eprintln!("Error: could not open {}: {e}", config.data_file.display());
            return ExitCode::FAILURE;
        }
    };

    let command = args.command.unwrap_or(Command::Home);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = cli::execute(&mut manager, &command, &config, &mut out)
        .and_then(|()| out.flush().map_err(CliError::from));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::warn!(error = %e, ?command, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log file used when `--log-file` is not given.
fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("dailyquest.log")
}

/// Install the file logger. Stdout carries command output, so logs never
/// go there.
///
/// `RUST_LOG` wins over `level`. Returns `None` without logging when the
/// path has no file name; otherwise the guard must live until exit so
/// buffered entries get flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let path = file_path.map_or_else(default_log_file, Path::to_path_buf);
    let appender = tracing_appender::rolling::never(path.parent()?, path.file_name()?);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Some(guard)
}
