use std::error::Error;

use anyhow::Context;
use lettre::Transport;
use log::{debug, info};

use crate::{
    comic::ComicIdentity,
    notification::{DeliveryReport, Notifier},
    source::SourceFetcher,
    store::MarkerStore,
};

#[derive(Debug)]
pub enum Outcome {
    /// The latest comic has already been announced
    NoNewComic(ComicIdentity),
    /// The latest comic was stored and announced
    NewComic {
        comic: ComicIdentity,
        report: DeliveryReport,
    },
}

/// Compares the latest comic against the stored marker and notifies on change
///
/// The marker is saved before any email is sent so a failed delivery is never retried on a later
/// run (at most once delivery).
pub fn check_for_new_comic<T>(
    store: &mut dyn MarkerStore,
    fetcher: &dyn SourceFetcher,
    notifier: &Notifier<T>,
    recipients: &[String],
) -> anyhow::Result<Outcome>
where
    T: Transport,
    T::Error: Error + Send + Sync + 'static,
{
    let previous = store
        .load_previous()
        .context("Failed to load previous comic name")?;
    debug!("Previous comic: {previous:?}");

    let current = fetcher
        .fetch_latest()
        .with_context(|| format!("Failed to fetch latest comic from {:?}", fetcher.url()))?;
    debug!("Current comic: {current}");

    if current.marker() == previous {
        info!("No new comic found");
        return Ok(Outcome::NoNewComic(current));
    }

    info!("New comic found: {current}");
    store
        .save_previous(current.marker())
        .context("Failed to save new comic name")?;

    let report = notifier
        .notify(recipients, &current)
        .context("Failed to send notifications")?;
    Ok(Outcome::NewComic {
        comic: current,
        report,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use lettre::transport::stub::StubTransport;

    use super::*;
    use crate::{
        error::FetchError,
        notification::{test_utils::RecordingTransport, DeliveryPolicy},
        source::SITE_URL,
        store::{FileMarkerStore, MemoryMarkerStore},
        test_logger,
    };

    /// Returns the same comic every time and counts the calls
    struct StaticFetcher {
        title: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl StaticFetcher {
        fn new(title: &'static str) -> Self {
            Self {
                title: Some(title),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                title: None,
                calls: Cell::new(0),
            }
        }
    }

    impl SourceFetcher for StaticFetcher {
        fn fetch_latest(&self) -> Result<ComicIdentity, FetchError> {
            self.calls.set(self.calls.get() + 1);
            match self.title {
                Some(title) => Ok(ComicIdentity::new(
                    title,
                    Some(format!("{SITE_URL}/comic")),
                )),
                None => Err(FetchError::MissingTitle {
                    url: SITE_URL.to_string(),
                }),
            }
        }

        fn url(&self) -> &str {
            SITE_URL
        }
    }

    fn recipients() -> Vec<String> {
        vec!["alice@example.com".to_string(), "bob@example.com".to_string()]
    }

    fn recording_notifier(policy: DeliveryPolicy) -> Notifier<RecordingTransport> {
        Notifier::new(
            "updates@example.com".parse().unwrap(),
            RecordingTransport::default(),
            SITE_URL,
            policy,
        )
    }

    #[test]
    fn new_comic_is_stored_and_sent() {
        // Arrange
        test_logger::start();
        let mut store = MemoryMarkerStore::new("Comic A");
        let fetcher = StaticFetcher::new("Comic B");
        let notifier = recording_notifier(DeliveryPolicy::Abort);

        // Act
        let outcome = check_for_new_comic(&mut store, &fetcher, &notifier, &recipients()).unwrap();

        // Assert
        assert!(matches!(outcome, Outcome::NewComic { ref comic, .. } if comic.title == "Comic B"));
        assert_eq!(store.value(), "Comic B");
        let sent = notifier.transport().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, vec!["alice@example.com".to_string()]);
        assert_eq!(sent[1].to, vec!["bob@example.com".to_string()]);
        let lines = test_logger::lines();
        for expected in [
            "Sending emails as: updates@example.com",
            "Emailing 'alice@example.com'",
            "Emailing 'bob@example.com'",
            "Done",
        ] {
            assert!(lines.iter().any(|l| l == expected), "{expected:?} not in {lines:?}");
        }
        assert!(!lines.iter().any(|l| l == "No new comic found"));
    }

    #[test]
    fn same_comic_sends_nothing() {
        // Arrange
        test_logger::start();
        let mut store = MemoryMarkerStore::new("Comic A");
        let fetcher = StaticFetcher::new("Comic A");
        let notifier = recording_notifier(DeliveryPolicy::Abort);

        // Act
        let outcome = check_for_new_comic(&mut store, &fetcher, &notifier, &recipients()).unwrap();

        // Assert
        assert!(matches!(outcome, Outcome::NoNewComic(_)));
        assert_eq!(store.saves(), 0);
        assert!(notifier.transport().sent().is_empty());
        let lines = test_logger::lines();
        assert!(lines.iter().any(|l| l == "No new comic found"), "{lines:?}");
        assert!(!lines.iter().any(|l| l.starts_with("Sending emails as:")));
    }

    #[test]
    fn second_run_is_idempotent() {
        let mut store = MemoryMarkerStore::new("Comic A");
        let fetcher = StaticFetcher::new("Comic B");
        let notifier = recording_notifier(DeliveryPolicy::Abort);

        check_for_new_comic(&mut store, &fetcher, &notifier, &recipients()).unwrap();
        let second = check_for_new_comic(&mut store, &fetcher, &notifier, &recipients()).unwrap();

        assert!(matches!(second, Outcome::NoNewComic(_)));
        assert_eq!(fetcher.calls.get(), 2);
        assert_eq!(store.saves(), 1);
        assert_eq!(store.value(), "Comic B");
        assert_eq!(notifier.transport().sent().len(), 2);
    }

    #[test]
    fn marker_saved_before_failed_delivery() {
        // Arrange
        let mut store = MemoryMarkerStore::new("Comic A");
        let fetcher = StaticFetcher::new("Comic B");
        let notifier = Notifier::new(
            "updates@example.com".parse().unwrap(),
            StubTransport::new_error(),
            SITE_URL,
            DeliveryPolicy::Abort,
        );

        // Act
        let first = check_for_new_comic(&mut store, &fetcher, &notifier, &recipients());
        let second = check_for_new_comic(&mut store, &fetcher, &notifier, &recipients());

        // Assert
        assert!(first.is_err());
        assert_eq!(store.value(), "Comic B");
        assert!(matches!(second, Ok(Outcome::NoNewComic(_))));
    }

    #[test]
    fn fetch_failure_leaves_marker() {
        let mut store = MemoryMarkerStore::new("Comic A");
        let fetcher = StaticFetcher::failing();
        let notifier = recording_notifier(DeliveryPolicy::Abort);

        let actual = check_for_new_comic(&mut store, &fetcher, &notifier, &recipients());

        assert!(actual.is_err());
        assert_eq!(store.value(), "Comic A");
        assert_eq!(store.saves(), 0);
        assert!(notifier.transport().sent().is_empty());
    }

    #[test]
    fn continue_policy_reports_failures() {
        let mut store = MemoryMarkerStore::new("Comic A");
        let fetcher = StaticFetcher::new("Comic B");
        let notifier = Notifier::new(
            "updates@example.com".parse().unwrap(),
            RecordingTransport::rejecting("alice@example.com"),
            SITE_URL,
            DeliveryPolicy::Continue,
        );

        let outcome = check_for_new_comic(&mut store, &fetcher, &notifier, &recipients()).unwrap();

        match outcome {
            Outcome::NewComic { report, .. } => {
                assert_eq!(report.sent, vec!["bob@example.com".to_string()]);
                assert_eq!(report.failed.len(), 1);
            }
            other => panic!("expected new comic got {other:?}"),
        }
        assert_eq!(store.value(), "Comic B");
    }

    #[test]
    fn first_run_with_marker_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".previous_comic_name.txt");
        let mut store = FileMarkerStore::new(&path);
        let fetcher = StaticFetcher::new("Comic A");
        let notifier = recording_notifier(DeliveryPolicy::Abort);

        // Act
        let first = check_for_new_comic(&mut store, &fetcher, &notifier, &recipients()).unwrap();
        let second = check_for_new_comic(&mut store, &fetcher, &notifier, &recipients()).unwrap();

        // Assert
        assert!(matches!(first, Outcome::NewComic { .. }));
        assert!(matches!(second, Outcome::NoNewComic(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Comic A");
        assert_eq!(notifier.transport().sent().len(), 2);
    }
}
