//! URL discovery in LaTeX source
//!
//! Two modes are supported:
//! - tag-scoped: `\tag{url}` (optionally `\tag[options]{url}`) for a given set of tags
//! - unscoped: every bare `http://` or `https://` token
//!
//! No LaTeX grammar is involved. A `}` always ends the captured URL and an
//! unterminated tag is simply not a match.

use crate::types::MatchSpan;
use regex::Regex;

/// Tags scanned when the caller does not supply any
pub const DEFAULT_TAGS: &[&str] = &["includegraphics", "url"];

/// Bare URL pattern. `$-_` is a range and admits `/ : ; = ? [ ]` among others.
const BARE_URL_PATTERN: &str = r"https?://(?:[a-zA-Z0-9]|[$-_@.&+]|[!*(),]|%[0-9a-fA-F]{2})+";

/// Matching mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchMode {
    /// Only URLs that are the argument of one of these tags
    Tags(Vec<String>),
    /// Any bare http(s) URL
    All,
}

impl Default for MatchMode {
    fn default() -> Self {
        MatchMode::Tags(DEFAULT_TAGS.iter().map(|t| t.to_string()).collect())
    }
}

/// Compiled URL matcher
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    regex: Option<Regex>,
    scoped: bool,
}

impl UrlMatcher {
    /// Compile a matcher for the given mode
    ///
    /// Fails only when the pattern exceeds the regex size limit, e.g. for a
    /// very long tag list.
    pub fn new(mode: &MatchMode) -> Result<Self, regex::Error> {
        match mode {
            MatchMode::Tags(tags) => {
                let names: Vec<String> = tags
                    .iter()
                    .map(|t| t.trim().trim_start_matches('\\'))
                    .filter(|t| !t.is_empty())
                    .map(regex::escape)
                    .collect();
                if names.is_empty() {
                    return Ok(Self {
                        regex: None,
                        scoped: true,
                    });
                }
                let pattern = format!(
                    r"(?P<prefix>\\(?:{})(?:\[[^\]]*\])?\{{)(?P<url>[^}}]+)(?P<suffix>\}})",
                    names.join("|")
                );
                Ok(Self {
                    regex: Some(Regex::new(&pattern)?),
                    scoped: true,
                })
            }
            MatchMode::All => Ok(Self {
                regex: Some(Regex::new(BARE_URL_PATTERN)?),
                scoped: false,
            }),
        }
    }

    /// Lazily yield non-overlapping spans, left to right
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> impl Iterator<Item = MatchSpan<'t>> + 'r
    where
        't: 'r,
    {
        let scoped = self.scoped;
        self.regex
            .iter()
            .flat_map(move |re| re.captures_iter(text))
            .filter_map(move |caps| {
                let whole = caps.get(0)?;
                if scoped {
                    let prefix = caps.name("prefix")?;
                    let url = caps.name("url")?;
                    let suffix = caps.name("suffix")?;
                    Some(MatchSpan {
                        prefix: prefix.as_str(),
                        url: url.as_str(),
                        suffix: suffix.as_str(),
                        range: whole.range(),
                    })
                } else {
                    Some(MatchSpan {
                        prefix: "",
                        url: whole.as_str(),
                        suffix: "",
                        range: whole.range(),
                    })
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> MatchMode {
        MatchMode::Tags(names.iter().map(|s| s.to_string()).collect())
    }

    fn urls(matcher: &UrlMatcher, text: &str) -> Vec<String> {
        matcher.find_iter(text).map(|s| s.url.to_string()).collect()
    }

    #[test]
    fn test_default_tags() {
        let m = UrlMatcher::new(&MatchMode::default()).unwrap();
        let text = r"\includegraphics{http://a.org/x.png} and \url{https://b.org/y.pdf}";
        assert_eq!(urls(&m, text), vec!["http://a.org/x.png", "https://b.org/y.pdf"]);
    }

    #[test]
    fn test_span_reconstructs_source() {
        let m = UrlMatcher::new(&MatchMode::default()).unwrap();
        let text = "before \\includegraphics{http://a.org/x.png}\nafter";
        let spans: Vec<_> = m.find_iter(text).collect();
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.prefix, r"\includegraphics{");
        assert_eq!(span.suffix, "}");
        assert_eq!(
            format!("{}{}{}", span.prefix, span.url, span.suffix),
            &text[span.range.clone()]
        );
    }

    #[test]
    fn test_optional_argument_is_part_of_prefix() {
        let m = UrlMatcher::new(&MatchMode::default()).unwrap();
        let text = r"\includegraphics[width=0.5\textwidth]{http://a.org/x.png}";
        let span = m.find_iter(text).next().unwrap();
        assert_eq!(span.prefix, r"\includegraphics[width=0.5\textwidth]{");
        assert_eq!(span.url, "http://a.org/x.png");
    }

    #[test]
    fn test_unterminated_tag_is_not_a_match() {
        let m = UrlMatcher::new(&MatchMode::default()).unwrap();
        assert!(urls(&m, r"\url{http://a.org/x.png").is_empty());
    }

    #[test]
    fn test_closing_brace_ends_capture() {
        let m = UrlMatcher::new(&MatchMode::default()).unwrap();
        let text = r"\url{http://a.org/{x}.png}";
        assert_eq!(urls(&m, text), vec!["http://a.org/{x"]);
    }

    #[test]
    fn test_other_tags_ignored() {
        let m = UrlMatcher::new(&MatchMode::default()).unwrap();
        assert!(urls(&m, r"\href{http://a.org}{text} \urlx{http://b.org}").is_empty());
    }

    #[test]
    fn test_custom_tags_are_escaped() {
        let m = UrlMatcher::new(&tags(&["input", "my.tag"])).unwrap();
        let text = r"\input{http://a.org/a.tex} \myxtag{http://b.org} \my.tag{http://c.org}";
        assert_eq!(urls(&m, text), vec!["http://a.org/a.tex", "http://c.org"]);
    }

    #[test]
    fn test_leading_backslash_in_tag_name_is_tolerated() {
        let m = UrlMatcher::new(&tags(&[r"\url"])).unwrap();
        assert_eq!(urls(&m, r"\url{http://a.org}"), vec!["http://a.org"]);
    }

    #[test]
    fn test_empty_tag_set_matches_nothing() {
        let m = UrlMatcher::new(&tags(&[])).unwrap();
        assert!(urls(&m, r"\url{http://a.org}").is_empty());
    }

    #[test]
    fn test_oversized_tag_list_is_an_error() {
        let names: Vec<String> = (0..100_000)
            .map(|i| format!("t{i:06}abcdefghijklmnopqrstuvwxyz"))
            .collect();
        let err = UrlMatcher::new(&MatchMode::Tags(names)).unwrap_err();
        assert!(matches!(err, regex::Error::CompiledTooBig(_)));
    }

    #[test]
    fn test_bare_urls() {
        let m = UrlMatcher::new(&MatchMode::All).unwrap();
        let text = "See http://x.org/a.zip for details.";
        let spans: Vec<_> = m.find_iter(text).collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].url, "http://x.org/a.zip");
        assert_eq!(spans[0].prefix, "");
        assert_eq!(spans[0].suffix, "");
        assert_eq!(&text[..spans[0].range.start], "See ");
        assert_eq!(&text[spans[0].range.end..], " for details.");
    }

    #[test]
    fn test_bare_url_inside_tag_stops_at_brace() {
        let m = UrlMatcher::new(&MatchMode::All).unwrap();
        let text = r"\url{https://x.org/a%20b.png?v=1}";
        assert_eq!(urls(&m, text), vec!["https://x.org/a%20b.png?v=1"]);
    }

    #[test]
    fn test_bare_mode_ignores_other_schemes() {
        let m = UrlMatcher::new(&MatchMode::All).unwrap();
        assert!(urls(&m, "ftp://x.org/a mailto:a@b.c").is_empty());
    }

    #[test]
    fn test_scan_is_restartable_and_non_overlapping() {
        let m = UrlMatcher::new(&MatchMode::All).unwrap();
        let text = "http://a.org/1 http://b.org/2\nhttps://c.org/3";
        let first: Vec<_> = m.find_iter(text).collect();
        let second: Vec<_> = m.find_iter(text).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        for pair in first.windows(2) {
            assert!(pair[0].range.end <= pair[1].range.start);
        }
    }
}
