//! TeXURL - offline copies of the remote assets a LaTeX document references
//!
//! The library scans LaTeX source for URLs, downloads the ones that point at
//! embeddable assets into a dump directory, and rewrites the document so each
//! reference points at the local copy.
//!
//! ## Pipeline
//!
//! - [`UrlMatcher`] finds `\includegraphics{...}`/`\url{...}` arguments (or
//!   every bare URL) as [`MatchSpan`]s
//! - [`ResourceSource::probe`] checks reachability and content type
//! - [`derive_name`] turns the URL into a stable file name
//! - [`fetch_and_store`] downloads at most once per file name
//! - [`DocumentRewriter`] splices the local paths back in
//!
//! URLs that fail any step are left exactly as written.

mod error;
pub mod matcher;
pub mod naming;
pub mod probe;
mod rewrite;
pub mod source;
mod store;
mod types;

pub use error::{FetchError, RewriteError};
pub use matcher::{MatchMode, UrlMatcher, DEFAULT_TAGS};
pub use naming::derive_name;
pub use rewrite::{
    rewrite_document, to_forward_slashes, DocumentRewriter, RewriteConfig, DEFAULT_DUMP_DIR,
};
pub use source::{HttpSource, HttpSourceBuilder, ResourceSource};
pub use store::fetch_and_store;
pub use types::{DownloadRecord, MatchSpan, ProbeResult, RewriteOutcome, SkippedUrl};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = concat!("TeXURL/", env!("CARGO_PKG_VERSION"));
