//! Configuration for an optimizer and the page it runs for.

use crate::storage::StorageKey;
use crate::style::css_matcher::Safelist;
use std::path::Path;
use std::time::Duration;

/// User-Agent fragments that mark a mobile browser.
const MOBILE_AGENTS: &[&str] = &[
    "Mobile",
    "Android",
    "Silk/",
    "Kindle",
    "BlackBerry",
    "Opera Mini",
    "Opera Mobi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinifyMode {
    /// Strip comments and whitespace only.
    #[default]
    Whitespace,
    /// Run lightningcss minification first, falling back to `Whitespace` on parse errors.
    Lightning,
}

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub safelist: Safelist,
    /// Upper bound for a single stylesheet fetch.
    pub fetch_timeout: Duration,
    pub minify: MinifyMode,
    /// Fetch stylesheets in parallel on the rayon pool.
    pub concurrent_fetch: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            safelist: Safelist::default(),
            fetch_timeout: Duration::from_secs(10),
            minify: MinifyMode::default(),
            concurrent_fetch: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceClass {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceClass {
    pub fn from_user_agent(user_agent: &str) -> Self {
        if MOBILE_AGENTS.iter().any(|agent| user_agent.contains(agent)) {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        self == DeviceClass::Mobile
    }
}

/// The page being optimized: its URL and the device class it is served to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageContext {
    pub url: String,
    pub device: DeviceClass,
}

impl PageContext {
    pub fn new(url: impl Into<String>, device: DeviceClass) -> Self {
        PageContext {
            url: url.into(),
            device,
        }
    }

    /// A page loaded from disk; relative stylesheet links resolve next to it.
    pub fn for_file(path: &Path, device: DeviceClass) -> Option<Self> {
        let absolute = path.canonicalize().ok()?;
        let url = url::Url::from_file_path(absolute).ok()?;
        Some(PageContext::new(url, device))
    }

    pub fn storage_key(&self) -> StorageKey {
        StorageKey::new(self.url.clone(), self.device.is_mobile())
    }
}
