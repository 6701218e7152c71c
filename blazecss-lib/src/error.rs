//! Error types for the optimization pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A single stylesheet could not be retrieved. Never fatal on its own.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid stylesheet url `{0}`")]
    InvalidUrl(String),

    #[error("no stylesheet registered for {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("minification failed: {0}")]
    Minify(String),

    #[error("optimizer panicked: {0}")]
    Panic(String),
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
