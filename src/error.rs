use thiserror::Error;

/// Failure to obtain the latest comic from the remote site
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("An error occurred while making a request to {url:?}")]
    Request { url: String, source: reqwest::Error },

    #[error("An error occurred while making a request to {url:?}: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse feed from {url:?}")]
    Feed {
        url: String,
        source: feed_rs::parser::ParseFeedError,
    },

    #[error("No comic title found in response from {url:?}")]
    MissingTitle { url: String },

    #[error("Feed at {url:?} has no entries")]
    EmptyFeed { url: String },
}

/// Failure to deliver the notification to one recipient
#[derive(Debug, Error)]
pub enum MailDeliveryError {
    #[error("Invalid email address {address:?}")]
    Address {
        address: String,
        source: lettre::address::AddressError,
    },

    #[error("Failed to build message for {recipient:?}")]
    Build {
        recipient: String,
        source: lettre::error::Error,
    },

    #[error("Failed to deliver message to {recipient:?}")]
    Transport {
        recipient: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl MailDeliveryError {
    pub fn recipient(&self) -> &str {
        match self {
            MailDeliveryError::Address { address, .. } => address,
            MailDeliveryError::Build { recipient, .. } => recipient,
            MailDeliveryError::Transport { recipient, .. } => recipient,
        }
    }
}
