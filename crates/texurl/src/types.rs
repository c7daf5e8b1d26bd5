//! Core types for TeXURL

use serde::Serialize;
use std::ops::Range;
use std::path::PathBuf;

/// One URL occurrence found in a document
///
/// `prefix`, `url` and `suffix` are adjacent slices of the scanned text, so
/// `prefix + url + suffix` is exactly `&text[range]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan<'t> {
    /// Literal text before the URL (e.g. `\includegraphics{`), empty for bare URLs
    pub prefix: &'t str,
    /// The URL itself
    pub url: &'t str,
    /// Literal text after the URL (e.g. `}`), empty for bare URLs
    pub suffix: &'t str,
    /// Byte range of the whole match in the scanned text
    pub range: Range<usize>,
}

impl MatchSpan<'_> {
    /// Render the span with `replacement` in place of the URL
    pub fn render(&self, replacement: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + replacement.len() + self.suffix.len());
        out.push_str(self.prefix);
        out.push_str(replacement);
        out.push_str(self.suffix);
        out
    }
}

/// Outcome of the metadata-only check on a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// Resource may be downloaded
    Eligible {
        /// Normalized media type (`image/png`)
        content_type: String,
        /// Conventional extension with leading dot, if the type is mapped
        extension: Option<&'static str>,
    },
    /// Resource must be left alone
    Ineligible {
        /// Human-readable explanation
        reason: String,
    },
}

impl ProbeResult {
    /// Build an ineligible result
    pub fn ineligible(reason: impl Into<String>) -> Self {
        ProbeResult::Ineligible {
            reason: reason.into(),
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, ProbeResult::Eligible { .. })
    }

    /// Extension hint, `None` when ineligible or unmapped
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ProbeResult::Eligible { extension, .. } => *extension,
            ProbeResult::Ineligible { .. } => None,
        }
    }

    /// Rejection reason, `None` when eligible
    pub fn reason(&self) -> Option<&str> {
        match self {
            ProbeResult::Eligible { .. } => None,
            ProbeResult::Ineligible { reason } => Some(reason),
        }
    }
}

/// A resource that now has a local copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRecord {
    /// The remote URL
    pub url: String,
    /// Where the body lives on disk
    pub local_path: PathBuf,
    /// True if the file already existed and no request was made
    pub from_cache: bool,
}

/// A URL left unchanged in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: String,
}

/// Result of rewriting a whole document
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteOutcome {
    /// The rewritten document
    #[serde(skip)]
    pub text: String,
    /// Distinct URLs that were relinked
    pub downloads: Vec<DownloadRecord>,
    /// Distinct URLs that were left as-is
    pub skipped: Vec<SkippedUrl>,
}

impl RewriteOutcome {
    /// Number of downloads that hit the network
    pub fn fetched_count(&self) -> usize {
        self.downloads.iter().filter(|d| !d.from_cache).count()
    }

    /// Number of downloads served from the dump directory
    pub fn cached_count(&self) -> usize {
        self.downloads.iter().filter(|d| d.from_cache).count()
    }
}
