use std::sync::OnceLock;

use anyhow::Context;
use log::debug;
use regex::Regex;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use crate::{comic::ComicIdentity, error::FetchError};

pub const SITE_URL: &str = "https://madeofmistake.com";
pub const FEED_URL: &str = "https://madeofmistake.com/rss";

/// Retrieves the most recently published comic
pub trait SourceFetcher {
    fn fetch_latest(&self) -> Result<ComicIdentity, FetchError>;

    /// Endpoint this fetcher reads from
    fn url(&self) -> &str;
}

/// How the latest comic is discovered
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStrategy {
    /// Read the `<title>` of the site's front page
    Html,
    /// Read the first entry of the site's feed
    #[default]
    Feed,
}

impl SourceStrategy {
    pub fn default_url(&self) -> &'static str {
        match self {
            SourceStrategy::Html => SITE_URL,
            SourceStrategy::Feed => FEED_URL,
        }
    }

    pub fn build_fetcher(&self, url: Option<&str>) -> anyhow::Result<Box<dyn SourceFetcher>> {
        let url = url.unwrap_or(self.default_url()).to_string();
        debug!("Using {self:?} strategy for {url:?}");
        let fetcher: Box<dyn SourceFetcher> = match self {
            SourceStrategy::Html => Box::new(HtmlTitleFetcher::new(url)?),
            SourceStrategy::Feed => Box::new(FeedFetcher::new(url)?),
        };
        Ok(fetcher)
    }
}

fn build_client() -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Single GET, anything but a success status is an error
fn get(client: &Client, url: &str) -> Result<Response, FetchError> {
    debug!("Requesting {url:?}");
    let response = client.get(url).send().map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;
    let status = response.status();
    debug!("Response from {url:?}: {status}");
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(response)
}

/// Takes the comic title from the page title of the site
#[derive(Debug)]
pub struct HtmlTitleFetcher {
    client: Client,
    url: String,
}

impl HtmlTitleFetcher {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: url.into(),
        })
    }
}

impl SourceFetcher for HtmlTitleFetcher {
    fn fetch_latest(&self) -> Result<ComicIdentity, FetchError> {
        let body = get(&self.client, &self.url)?
            .text()
            .map_err(|source| FetchError::Request {
                url: self.url.clone(),
                source,
            })?;
        parse_title(&body).ok_or_else(|| FetchError::MissingTitle {
            url: self.url.clone(),
        })
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Extracts the title element of the document head. Returns None if there is no title or it is blank
pub fn parse_title(html: &str) -> Option<ComicIdentity> {
    static CELL_COMMENT: OnceLock<Regex> = OnceLock::new();
    static CELL_HEAD: OnceLock<Regex> = OnceLock::new();
    static CELL_TITLE: OnceLock<Regex> = OnceLock::new();
    let re_comment = CELL_COMMENT.get_or_init(|| {
        debug!("Compiling regexes for extracting page titles");
        Regex::new(r"(?s)<!--.*?-->").expect("failed to compile regex")
    });
    // An unclosed head ends where the body starts
    let re_head = CELL_HEAD.get_or_init(|| {
        Regex::new(r"(?is)<head\b[^>]*>(.*?)(?:</head\s*>|<body\b|\z)")
            .expect("failed to compile regex")
    });
    let re_title = CELL_TITLE.get_or_init(|| {
        Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("failed to compile regex")
    });

    let html = re_comment.replace_all(html, "");
    let head = re_head.captures(&html)?.get(1)?.as_str();
    let raw = re_title.captures(head)?.get(1)?.as_str();
    let decoded = html_escape::decode_html_entities(raw);
    let comic = ComicIdentity::new(&decoded, None);
    if comic.title.is_empty() {
        None
    } else {
        Some(comic)
    }
}

/// Takes the comic title and link from the first entry of a RSS or Atom feed
#[derive(Debug)]
pub struct FeedFetcher {
    client: Client,
    url: String,
}

impl FeedFetcher {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: url.into(),
        })
    }
}

impl SourceFetcher for FeedFetcher {
    fn fetch_latest(&self) -> Result<ComicIdentity, FetchError> {
        let body = get(&self.client, &self.url)?
            .bytes()
            .map_err(|source| FetchError::Request {
                url: self.url.clone(),
                source,
            })?;
        parse_feed(&self.url, &body)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// `url` is only used for error reporting
pub fn parse_feed(url: &str, body: &[u8]) -> Result<ComicIdentity, FetchError> {
    let feed = feed_rs::parser::parse(body).map_err(|source| FetchError::Feed {
        url: url.to_string(),
        source,
    })?;
    debug!("Feed from {url:?} has {} entries", feed.entries.len());

    let entry = feed
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::EmptyFeed {
            url: url.to_string(),
        })?;
    let link = entry.links.into_iter().next().map(|link| link.href);
    let comic = match entry.title {
        Some(title) => ComicIdentity::new(&title.content, link),
        None => ComicIdentity::new("", link),
    };
    if comic.title.is_empty() {
        return Err(FetchError::MissingTitle {
            url: url.to_string(),
        });
    }
    Ok(comic)
}
