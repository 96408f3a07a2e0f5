use std::{env, path::PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::LevelFilter;

const DEFAULT_CONFIG: &str = "~/.config/made-of-mistake-email-updater.toml";
const MARKER_FILENAME: &str = ".previous_comic_name.txt";

#[derive(Parser, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default)]
#[command(
    author,
    version,
    about,
    long_about = "Checks Made of Mistake for a new comic and emails subscribers when one is published."
)]
pub struct Cli {
    /// Specify config file to use
    ///
    /// If not specified uses `.config/made-of-mistake-email-updater.toml` in users home folder
    #[arg(long = "config", short, value_name = "PATH")]
    pub config_filename: Option<String>,

    /// File holding the name of the last comic subscribers were emailed about
    ///
    /// If not specified uses `.previous_comic_name.txt` next to the executable
    #[arg(long = "marker", short, value_name = "PATH")]
    pub marker_filename: Option<String>,

    /// Folder the log file is written to
    #[arg(long, value_name = "PATH", default_value = "log")]
    pub log_dir: String,

    /// Set logging level to use
    #[arg(long, short, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Cli {
    pub fn get_config_path(&self) -> PathBuf {
        match self.config_filename.as_ref() {
            Some(val) => PathBuf::from(val),
            None => PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG).into_owned()),
        }
    }

    pub fn get_marker_path(&self) -> anyhow::Result<PathBuf> {
        match self.marker_filename.as_ref() {
            Some(val) => Ok(PathBuf::from(val)),
            None => {
                let exe = env::current_exe().context("Failed to locate the running executable")?;
                let dir = exe
                    .parent()
                    .with_context(|| format!("Executable {exe:?} has no parent folder"))?;
                Ok(dir.join(MARKER_FILENAME))
            }
        }
    }
}

/// Exists to provide better help messages variants copied from LevelFilter as
/// that's the type that is actually needed
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum LogLevel {
    /// Nothing emitted in this mode
    #[default]
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
