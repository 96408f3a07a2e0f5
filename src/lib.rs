mod cli;
mod comic;
mod config;
pub mod error;
mod logging;
mod notification;
mod source;
mod store;
mod updater;
mod utils;

#[cfg(test)]
mod test_logger;

use anyhow::bail;
use log::{debug, error, info};

pub use cli::{Cli, LogLevel};
pub use comic::ComicIdentity;
pub use config::Config;
pub use logging::init_logging;
pub use notification::{DeliveryPolicy, DeliveryReport, Notifier};
pub use source::{FeedFetcher, HtmlTitleFetcher, SourceFetcher, SourceStrategy};
pub use store::{FileMarkerStore, MarkerStore, MemoryMarkerStore};
pub use updater::{check_for_new_comic, Outcome};

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(&cli.get_config_path())?;
    debug!("Loaded config: {config:?}");

    let mut store = FileMarkerStore::new(cli.get_marker_path()?);
    info!("Using previous comic file: {:?}", store.path());

    let fetcher = config
        .source
        .strategy
        .build_fetcher(config.source.url.as_deref())?;
    let notifier = Notifier::smtps(&config)?;

    let outcome = check_for_new_comic(
        &mut store,
        fetcher.as_ref(),
        &notifier,
        &config.recipients,
    )?;

    if let Outcome::NewComic { report, .. } = outcome {
        if !report.is_complete() {
            for failure in &report.failed {
                error!("Not delivered: {}", failure.recipient());
            }
            bail!(
                "Failed to deliver to {} of {} recipients",
                report.failed.len(),
                config.recipients.len()
            );
        }
    }
    Ok(())
}
