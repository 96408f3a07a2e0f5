// Copied and edited based on https://github.com/estk/log4rs/pull/295

use std::path::Path;

use anyhow::Context;
use log::LevelFilter;
use log4rs::Handle;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            policy::compound::{
                roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy,
            },
            RollingFileAppender,
        },
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} - {m}\n";

/// Logs to stderr at `level` and to a rolling file in `log_dir`
pub fn init_logging(level: LevelFilter, log_dir: &Path) -> anyhow::Result<Handle> {
    let config = build_config(level, log_dir)?;

    // Use this to change log levels at runtime.
    let handle = log4rs::init_config(config).context("Failed to init_config")?;

    Ok(handle)
}

fn build_config(level: LevelFilter, log_dir: &Path) -> anyhow::Result<Config> {
    let file_path = log_dir.join("comic_notifier.log");
    let archive_pattern = log_dir.join("comic_notifier_{}.log");
    let archive_pattern = archive_pattern
        .to_str()
        .with_context(|| format!("Log folder is not valid UTF-8: {log_dir:?}"))?;
    // Pattern: https://docs.rs/log4rs/*/log4rs/append/rolling_file/policy/compound/roll/fixed_window/struct.FixedWindowRollerBuilder.html#method.build

    // Build a stderr logger.
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build();

    // Create a policy to use with the file logging
    let trigger = SizeTrigger::new(2_097_152); // 2mb (2 * 1024 * 1024)
    let roller = FixedWindowRoller::builder()
        .build(archive_pattern, 10) // Roll based on pattern and max 10 archive files
        .context("Failed to create FixedWindowRoller")?;
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    // Logging to log file. (with rolling)
    let log_file = RollingFileAppender::builder()
        // Pattern: https://docs.rs/log4rs/*/log4rs/encode/pattern/index.html
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&file_path, Box::new(policy))
        .with_context(|| format!("Failed to open log file {file_path:?}"))?;

    Config::builder()
        .appender(Appender::builder().build("log_file", Box::new(log_file)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(
            Root::builder()
                .appender("log_file")
                .appender("stderr")
                .build(level),
        )
        .context("Failed to configure logging")
}
