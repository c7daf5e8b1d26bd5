//! Whole-document rewriting
//!
//! Drives the matcher over the document, probes and downloads each URL, and
//! splices local paths back into the matched spans. Everything outside the
//! spans is copied through byte for byte. Per-URL failures only produce skip
//! entries; the only fatal error is an unusable dump directory.

use crate::error::RewriteError;
use crate::matcher::{MatchMode, UrlMatcher, DEFAULT_TAGS};
use crate::naming::derive_name;
use crate::source::{HttpSource, ResourceSource};
use crate::store::fetch_and_store;
use crate::types::{MatchSpan, ProbeResult, RewriteOutcome, SkippedUrl};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default dump directory name, created next to the document
pub const DEFAULT_DUMP_DIR: &str = ".TeXURL_dump";

/// Rewrite configuration
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// Which URLs to look for
    pub mode: MatchMode,
    /// Where downloads are stored
    pub dump_dir: PathBuf,
    /// Emit paths relative to this directory when the download lies beneath it
    pub link_root: Option<PathBuf>,
    /// Relink references whose file was already in the dump directory
    pub rewrite_cached: bool,
    /// Extension used when the content type has no known mapping
    pub fallback_extension: Option<String>,
}

impl RewriteConfig {
    /// Default tags, tag-scoped mode, cached files relinked
    pub fn new(dump_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: MatchMode::default(),
            dump_dir: dump_dir.into(),
            link_root: None,
            rewrite_cached: true,
            fallback_extension: None,
        }
    }

    /// Scan these tags instead of the defaults
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mode = MatchMode::Tags(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Match every bare URL instead of tag arguments
    pub fn all(mut self, all: bool) -> Self {
        if all {
            self.mode = MatchMode::All;
        } else if self.mode == MatchMode::All {
            self.mode = MatchMode::Tags(DEFAULT_TAGS.iter().map(|t| t.to_string()).collect());
        }
        self
    }

    pub fn link_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.link_root = Some(root.into());
        self
    }

    pub fn rewrite_cached(mut self, rewrite: bool) -> Self {
        self.rewrite_cached = rewrite;
        self
    }

    pub fn fallback_extension(mut self, ext: impl Into<String>) -> Self {
        self.fallback_extension = Some(ext.into());
        self
    }
}

/// Rewrites documents against a [`ResourceSource`]
pub struct DocumentRewriter<'s> {
    source: &'s dyn ResourceSource,
    config: RewriteConfig,
    matcher: UrlMatcher,
}

/// Per-run state while walking the spans
#[derive(Default)]
struct RunState {
    outcome: RewriteOutcome,
    dump_ready: bool,
}

impl<'s> DocumentRewriter<'s> {
    /// Compile the matcher for `config`
    pub fn new(
        source: &'s dyn ResourceSource,
        config: RewriteConfig,
    ) -> Result<Self, RewriteError> {
        let matcher = UrlMatcher::new(&config.mode).map_err(RewriteError::Pattern)?;
        Ok(Self {
            source,
            config,
            matcher,
        })
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Rewrite `text`, returning the new text plus what was downloaded and skipped
    pub async fn rewrite(&self, text: &str) -> Result<RewriteOutcome, RewriteError> {
        let spans: Vec<MatchSpan<'_>> = self.matcher.find_iter(text).collect();
        debug!(
            source = self.source.name(),
            spans = spans.len(),
            "Scanned document"
        );

        let mut state = RunState::default();
        let mut resolved: HashMap<&str, Option<String>> = HashMap::new();
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;

        for span in &spans {
            out.push_str(&text[cursor..span.range.start]);

            let link = match resolved.get(span.url) {
                Some(link) => link.clone(),
                None => {
                    let link = self.resolve(span.url, &mut state).await?;
                    resolved.insert(span.url, link.clone());
                    link
                }
            };

            match link {
                Some(link) => out.push_str(&span.render(&link)),
                None => out.push_str(&text[span.range.clone()]),
            }
            cursor = span.range.end;
        }
        out.push_str(&text[cursor..]);

        let mut outcome = state.outcome;
        outcome.text = out;
        info!(
            downloaded = outcome.fetched_count(),
            cached = outcome.cached_count(),
            skipped = outcome.skipped.len(),
            "Rewrite complete"
        );
        Ok(outcome)
    }

    /// Decide what a URL becomes; `None` leaves it untouched
    async fn resolve(&self, url: &str, state: &mut RunState) -> Result<Option<String>, RewriteError> {
        let probe = self.source.probe(url).await;
        let (content_type, extension) = match probe {
            ProbeResult::Eligible {
                content_type,
                extension,
            } => (content_type, extension),
            ProbeResult::Ineligible { reason } => {
                skip(state, url, reason);
                return Ok(None);
            }
        };

        let Some(extension) = extension.or(self.config.fallback_extension.as_deref()) else {
            skip(
                state,
                url,
                format!("No file extension known for content type {content_type}"),
            );
            return Ok(None);
        };

        self.ensure_dump_dir(state).await?;

        let basename = derive_name(url, extension);
        let record = match fetch_and_store(self.source, url, &self.config.dump_dir, &basename).await
        {
            Ok(record) => record,
            Err(e) => {
                skip(state, url, e.to_string());
                return Ok(None);
            }
        };

        if record.from_cache && !self.config.rewrite_cached {
            skip(
                state,
                url,
                format!("Already downloaded to {}", record.local_path.display()),
            );
            return Ok(None);
        }

        let link = self.link_for(&record.local_path);
        debug!(url, link = %link, from_cache = record.from_cache, "Relinked");
        state.outcome.downloads.push(record);
        Ok(Some(link))
    }

    async fn ensure_dump_dir(&self, state: &mut RunState) -> Result<(), RewriteError> {
        if state.dump_ready {
            return Ok(());
        }
        let dir = &self.config.dump_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| RewriteError::DumpDir {
                path: dir.clone(),
                source,
            })?;
        state.dump_ready = true;
        Ok(())
    }

    /// Path as it should appear in the document
    fn link_for(&self, path: &Path) -> String {
        let path = self
            .config
            .link_root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        to_forward_slashes(path)
    }
}

fn skip(state: &mut RunState, url: &str, reason: impl Into<String>) {
    let reason = reason.into();
    warn!(url, reason = %reason, "Leaving URL unchanged");
    state.outcome.skipped.push(SkippedUrl {
        url: url.to_string(),
        reason,
    });
}

/// Render a path with `/` separators on every platform
pub fn to_forward_slashes(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '\\' {
        rendered.replace('\\', "/")
    } else {
        rendered.into_owned()
    }
}

/// Rewrite `text` using a default [`HttpSource`]
///
/// For a custom user agent or timeouts build an [`HttpSource`] and use
/// [`DocumentRewriter`] directly.
pub async fn rewrite_document(
    text: &str,
    config: RewriteConfig,
) -> Result<RewriteOutcome, RewriteError> {
    let source = HttpSource::new()?;
    DocumentRewriter::new(&source, config)?.rewrite(text).await
}
