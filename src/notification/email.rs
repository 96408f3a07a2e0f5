use std::error::Error;

use anyhow::Context;
use lettre::{message::Mailbox, SmtpTransport, Transport};
use log::{debug, error, info};
use serde::Deserialize;

use super::message::build_message;
use crate::{comic::ComicIdentity, config::Config, error::MailDeliveryError};

/// What to do with the remaining recipients after a delivery fails
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Stop at the first failure and return it
    #[default]
    Abort,
    /// Attempt every recipient and collect the failures
    Continue,
}

#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub sent: Vec<String>,
    pub failed: Vec<MailDeliveryError>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Emails subscribers about a new comic, one message per recipient
pub struct Notifier<T> {
    sender: Mailbox,
    transport: T,
    site_url: String,
    policy: DeliveryPolicy,
}

impl Notifier<SmtpTransport> {
    /// Authenticated SMTPS (TLS from connection start) relay described by `config`
    pub fn smtps(config: &Config) -> anyhow::Result<Self> {
        let sender = config.sender.mailbox()?;
        let credentials = config.sender.credentials()?;
        debug!(
            "Building SMTP transport for {}:{}",
            config.smtp.host, config.smtp.port
        );
        let transport = SmtpTransport::relay(&config.smtp.host)
            .with_context(|| format!("Failed to create SMTP relay for {:?}", config.smtp.host))?
            .port(config.smtp.port)
            .credentials(credentials)
            .build();
        Ok(Self::new(
            sender,
            transport,
            config.source.site_url(),
            config.on_delivery_failure,
        ))
    }
}

impl<T> Notifier<T>
where
    T: Transport,
    T::Error: Error + Send + Sync + 'static,
{
    pub fn new(
        sender: Mailbox,
        transport: T,
        site_url: impl Into<String>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            sender,
            transport,
            site_url: site_url.into(),
            policy,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `comic` to every recipient in order
    pub fn notify(
        &self,
        recipients: &[String],
        comic: &ComicIdentity,
    ) -> Result<DeliveryReport, MailDeliveryError> {
        info!("Sending emails as: {}", self.sender);
        let mut report = DeliveryReport::default();
        for recipient in recipients {
            info!("Emailing '{recipient}'");
            match self.send_one(recipient, comic) {
                Ok(()) => report.sent.push(recipient.clone()),
                Err(e) if self.policy == DeliveryPolicy::Abort => return Err(e),
                Err(e) => {
                    match e.source() {
                        Some(source) => error!("{e}: {source}"),
                        None => error!("{e}"),
                    }
                    report.failed.push(e);
                }
            }
        }
        info!("Done");
        Ok(report)
    }

    fn send_one(&self, recipient: &str, comic: &ComicIdentity) -> Result<(), MailDeliveryError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|source| MailDeliveryError::Address {
                address: recipient.to_string(),
                source,
            })?;
        let message = build_message(self.sender.clone(), to, comic, &self.site_url).map_err(
            |source| MailDeliveryError::Build {
                recipient: recipient.to_string(),
                source,
            },
        )?;
        self.transport
            .send(&message)
            .map_err(|e| MailDeliveryError::Transport {
                recipient: recipient.to_string(),
                source: Box::new(e),
            })?;
        debug!("Delivered to {recipient:?}");
        Ok(())
    }
}
