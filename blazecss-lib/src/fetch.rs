//! Stylesheet retrieval.

use crate::error::FetchError;
use std::collections::HashMap;
use std::fs;
use std::time::Duration;
use url::Url;

pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches `http(s)://` URLs with a blocking reqwest client and reads `file://`
/// URLs from disk.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("blazecss/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpFetcher { client })
    }

    fn read_file(url: &str) -> Result<String, FetchError> {
        let path = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.to_file_path().ok())
            .ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;
        fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.starts_with("file:") {
            return Self::read_file(url);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let http_error = |source: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            source,
        };
        self.client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(http_error)
    }
}

/// Serves stylesheets from memory. Handy for tests and for embedders that
/// already hold the CSS.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    sheets: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, css: impl Into<String>) -> Self {
        self.sheets.insert(url.into(), css.into());
        self
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.sheets
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

/// Resolves a stylesheet `href` against the document's `<base href>` (if any)
/// and the page URL. Hrefs that cannot be resolved are returned unchanged.
pub fn resolve_url(page_url: &str, base_href: Option<&str>, href: &str) -> String {
    let page = Url::parse(page_url).ok();
    let base = match base_href {
        Some(base_href) => page
            .as_ref()
            .and_then(|page| page.join(base_href).ok())
            .or_else(|| Url::parse(base_href).ok()),
        None => page,
    };
    match base {
        Some(base) => base
            .join(href)
            .map(|resolved| resolved.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => Url::parse(href)
            .map(|absolute| absolute.to_string())
            .unwrap_or_else(|_| href.to_string()),
    }
}
