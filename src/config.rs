use std::{env, fmt::Debug, fs, path::Path};

use anyhow::{bail, Context};
use lettre::{message::Mailbox, transport::smtp::authentication::Credentials};
use log::{debug, warn};
use serde::Deserialize;

use crate::{
    notification::DeliveryPolicy,
    source::{SourceStrategy, SITE_URL},
};

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Addresses to notify about a new comic, in the order they are emailed
    pub recipients: Vec<String>,

    /// Account the notifications are sent from
    pub sender: Sender,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Whether a failed delivery stops the remaining ones
    #[serde(default)]
    pub on_delivery_failure: DeliveryPolicy,
}

impl Config {
    /// Reads JSON if the extension is `.json` and TOML otherwise
    pub fn load_from(config_path: &Path) -> anyhow::Result<Config> {
        debug!("Loading Config from: {config_path:?}");
        let file_contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read contents of {config_path:?}"))?;
        let is_json = config_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let result: Config = if is_json {
            serde_json::from_str(&file_contents)
                .with_context(|| format!("Failed to parse contents of {config_path:?}"))?
        } else {
            toml::from_str(&file_contents)
                .with_context(|| format!("Failed to parse contents of {config_path:?}"))?
        };
        result
            .validate()
            .with_context(|| format!("Invalid configuration in {config_path:?}"))?;
        Ok(result)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.sender.mailbox()?;
        self.sender.secret_source()?;
        for recipient in &self.recipients {
            recipient
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid recipient address {recipient:?}"))?;
        }
        if self.recipients.is_empty() {
            warn!("No recipients configured. New comics will not be emailed to anyone");
        }
        Ok(())
    }
}

/// Login for the mail relay. The secret is never printed
#[derive(Deserialize)]
pub struct Sender {
    pub email: String,

    /// Password given directly in the config
    #[serde(default)]
    password: Option<String>,

    /// Name of an environment variable holding the password
    #[serde(default)]
    password_env: Option<String>,
}

impl Sender {
    pub fn mailbox(&self) -> anyhow::Result<Mailbox> {
        self.email
            .parse()
            .with_context(|| format!("Invalid sender address {:?}", self.email))
    }

    /// SMTP AUTH login is the bare address even if `email` has a display name
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        let login = self.mailbox()?.email.to_string();
        Ok(Credentials::new(login, self.secret()?))
    }

    fn secret_source(&self) -> anyhow::Result<SecretSource<'_>> {
        match (&self.password, &self.password_env) {
            (Some(password), None) => Ok(SecretSource::Literal(password)),
            (None, Some(var)) => Ok(SecretSource::Environment(var)),
            (Some(_), Some(_)) => bail!("Only one of password and password_env may be set"),
            (None, None) => bail!("Either password or password_env must be set for the sender"),
        }
    }

    pub fn secret(&self) -> anyhow::Result<String> {
        match self.secret_source()? {
            SecretSource::Literal(password) => Ok(password.to_string()),
            SecretSource::Environment(var) => env::var(var)
                .with_context(|| format!("Failed to read sender password from ${var}")),
        }
    }
}

enum SecretSource<'a> {
    Literal(&'a str),
    Environment(&'a str),
}

impl Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_env", &self.password_env)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub strategy: SourceStrategy,

    /// Overrides the strategy's default endpoint
    pub url: Option<String>,
}

impl SourceConfig {
    /// Link used in emails when the comic itself has none
    pub fn site_url(&self) -> &str {
        match (self.strategy, &self.url) {
            (SourceStrategy::Html, Some(url)) => url.as_str(),
            _ => SITE_URL,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "SmtpConfig::default_host")]
    pub host: String,

    /// Implicit TLS port
    #[serde(default = "SmtpConfig::default_port")]
    pub port: u16,
}

impl SmtpConfig {
    fn default_host() -> String {
        "smtp.gmail.com".to_string()
    }

    fn default_port() -> u16 {
        465
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}
