//! Persistence of optimized stylesheets, keyed by page URL and device class.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    pub url: String,
    pub is_mobile: bool,
}

impl StorageKey {
    pub fn new(url: impl Into<String>, is_mobile: bool) -> Self {
        StorageKey {
            url: url.into(),
            is_mobile,
        }
    }
}

pub trait CssStorage: Send + Sync {
    fn save(&self, key: &StorageKey, css: &str) -> io::Result<()>;
    fn load(&self, key: &StorageKey) -> io::Result<Option<String>>;
}

impl<T: CssStorage + ?Sized> CssStorage for Arc<T> {
    fn save(&self, key: &StorageKey, css: &str) -> io::Result<()> {
        (**self).save(key, css)
    }

    fn load(&self, key: &StorageKey) -> io::Result<Option<String>> {
        (**self).load(key)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStorage;

impl CssStorage for NoopStorage {
    fn save(&self, _key: &StorageKey, _css: &str) -> io::Result<()> {
        Ok(())
    }

    fn load(&self, _key: &StorageKey) -> io::Result<Option<String>> {
        Ok(None)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> io::Error {
    io::Error::new(io::ErrorKind::Other, "storage lock poisoned")
}

impl CssStorage for MemoryStorage {
    fn save(&self, key: &StorageKey, css: &str) -> io::Result<()> {
        self.entries
            .lock()
            .map_err(poisoned)?
            .insert(key.clone(), css.to_string());
        Ok(())
    }

    fn load(&self, key: &StorageKey) -> io::Result<Option<String>> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }
}

/// One `.css` file per key inside a cache directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `https://a.test/x?y` on mobile becomes `https___a.test_x_y-mobile.css`.
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        let stem: String = key
            .url
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let device = if key.is_mobile { "mobile" } else { "desktop" };
        self.dir.join(format!("{}-{}.css", stem, device))
    }
}

impl CssStorage for FileStorage {
    fn save(&self, key: &StorageKey, css: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), css)
    }

    fn load(&self, key: &StorageKey) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(css) => Ok(Some(css)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
