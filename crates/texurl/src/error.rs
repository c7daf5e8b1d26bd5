//! Error types for TeXURL

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while retrieving or storing a single resource
///
/// These never abort a rewrite; the affected reference is left untouched
/// and the error text is recorded as the skip reason.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed or uses an unsupported scheme
    #[error("Invalid URL: must be an absolute http:// or https:// URL")]
    InvalidUrl,

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request or body transfer exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Failed to connect to server
    #[error("Failed to connect to server: {0}")]
    ConnectError(#[source] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned HTTP {0}")]
    Status(u16),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Writing the downloaded body failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else if err.is_connect() {
            FetchError::ConnectError(err)
        } else {
            FetchError::RequestError(err.to_string())
        }
    }
}

/// Errors that stop a whole rewrite run
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The dump directory could not be created
    #[error("Failed to create dump directory {}: {source}", path.display())]
    DumpDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The URL pattern built from the tag list could not be compiled
    #[error("Failed to compile URL pattern")]
    Pattern(#[source] regex::Error),

    /// The HTTP source could not be constructed
    #[error(transparent)]
    Source(#[from] FetchError),
}
