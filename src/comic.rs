use std::fmt::Display;

use crate::utils::make_single_line;

/// The most recent publication known on the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComicIdentity {
    /// Title as shown by the site, always a single line
    pub title: String,

    /// Only available when read from the feed
    pub link: Option<String>,
}

impl ComicIdentity {
    pub fn new(title: &str, link: Option<String>) -> Self {
        Self {
            title: make_single_line(title).into_owned(),
            link: link
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
        }
    }

    /// Value persisted in the marker file and compared between runs
    pub fn marker(&self) -> &str {
        &self.title
    }

    pub fn link_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.link.as_deref().unwrap_or(fallback)
    }
}

impl From<&str> for ComicIdentity {
    fn from(title: &str) -> Self {
        Self::new(title, None)
    }
}

impl Display for ComicIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.link {
            Some(link) => write!(f, "{:?} ({link})", self.title),
            None => write!(f, "{:?}", self.title),
        }
    }
}
