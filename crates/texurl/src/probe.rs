//! Download eligibility from probe metadata
//!
//! Turns the status and Content-Type of a metadata-only response into a
//! [`ProbeResult`]. Markup and text responses are rejected: they are almost
//! always error pages, not embeddable assets.

use crate::types::ProbeResult;

/// Substrings that make a content type ineligible
const REJECTED_FRAGMENTS: &[&str] = &["text", "html"];

/// Media type to conventional file extension
const EXTENSIONS: &[(&str, &str)] = &[
    // Images
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/pjpeg", ".jpg"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/avif", ".avif"),
    ("image/svg+xml", ".svg"),
    ("image/bmp", ".bmp"),
    ("image/tiff", ".tif"),
    ("image/x-icon", ".ico"),
    ("image/vnd.microsoft.icon", ".ico"),
    ("image/heic", ".heic"),
    ("image/x-eps", ".eps"),
    // Documents
    ("application/pdf", ".pdf"),
    ("application/postscript", ".eps"),
    ("application/x-dvi", ".dvi"),
    ("application/json", ".json"),
    ("application/xml", ".xml"),
    ("application/msword", ".doc"),
    ("application/vnd.ms-excel", ".xls"),
    ("application/vnd.ms-powerpoint", ".ppt"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".pptx",
    ),
    // Archives
    ("application/zip", ".zip"),
    ("application/gzip", ".gz"),
    ("application/x-gzip", ".gz"),
    ("application/x-tar", ".tar"),
    ("application/x-bzip2", ".bz2"),
    ("application/x-xz", ".xz"),
    ("application/x-7z-compressed", ".7z"),
    ("application/vnd.rar", ".rar"),
    ("application/x-rar-compressed", ".rar"),
    // Audio
    ("audio/mpeg", ".mp3"),
    ("audio/wav", ".wav"),
    ("audio/x-wav", ".wav"),
    ("audio/ogg", ".ogg"),
    ("audio/flac", ".flac"),
    ("audio/aac", ".aac"),
    // Video
    ("video/mp4", ".mp4"),
    ("video/webm", ".webm"),
    ("video/ogg", ".ogv"),
    ("video/quicktime", ".mov"),
    ("video/x-msvideo", ".avi"),
    // Fonts
    ("font/ttf", ".ttf"),
    ("font/otf", ".otf"),
    ("font/woff", ".woff"),
    ("font/woff2", ".woff2"),
    // Generic binary
    ("application/octet-stream", ".bin"),
];

/// Normalize a Content-Type header value to its bare media type
///
/// Strips parameters, trims and lowercases. Returns `None` for values that
/// are not of the form `type/subtype` with printable ASCII on both sides.
pub fn normalize_content_type(value: &str) -> Option<String> {
    let media = value.split(';').next()?.trim().to_ascii_lowercase();
    let (kind, subtype) = media.split_once('/')?;
    if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
        return None;
    }
    if !media.bytes().all(|b| b.is_ascii_graphic()) {
        return None;
    }
    Some(media)
}

/// Check if a normalized content type is rejected outright
pub fn is_rejected_content_type(media: &str) -> bool {
    REJECTED_FRAGMENTS.iter().any(|frag| media.contains(frag))
}

/// Look up the conventional extension for a normalized content type
pub fn extension_for(media: &str) -> Option<&'static str> {
    EXTENSIONS
        .iter()
        .find(|(ct, _)| *ct == media)
        .map(|(_, ext)| *ext)
}

/// Decide eligibility from a probe response
///
/// Applies, in order: status check, content-type presence and shape,
/// rejected types, extension lookup. Transport failures are handled by the
/// caller before a status exists.
pub fn classify(status: u16, content_type: Option<&str>) -> ProbeResult {
    if !(200..300).contains(&status) {
        return ProbeResult::ineligible(format!("Server returned HTTP {status}"));
    }

    let Some(raw) = content_type else {
        return ProbeResult::ineligible("Missing Content-Type header");
    };

    let Some(media) = normalize_content_type(raw) else {
        return ProbeResult::ineligible(format!("Unparsable Content-Type: {raw:?}"));
    };

    if is_rejected_content_type(&media) {
        return ProbeResult::ineligible(format!("Rejected content type: {media}"));
    }

    let extension = extension_for(&media);
    ProbeResult::Eligible {
        content_type: media,
        extension,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_content_type() {
        assert_eq!(
            normalize_content_type("image/PNG"),
            Some("image/png".to_string())
        );
        assert_eq!(
            normalize_content_type(" application/pdf ; name=x.pdf"),
            Some("application/pdf".to_string())
        );
        assert_eq!(normalize_content_type(""), None);
        assert_eq!(normalize_content_type("garbage"), None);
        assert_eq!(normalize_content_type("image/"), None);
        assert_eq!(normalize_content_type("a/b/c"), None);
        assert_eq!(normalize_content_type("image/p ng"), None);
        assert_eq!(normalize_content_type("image/\u{FFFD}png"), None);
    }

    #[test]
    fn test_rejected_content_types() {
        assert!(is_rejected_content_type("text/html"));
        assert!(is_rejected_content_type("text/plain"));
        assert!(is_rejected_content_type("application/xhtml+xml"));
        assert!(is_rejected_content_type("application/vnd.oasis.opendocument.text"));

        assert!(!is_rejected_content_type("image/png"));
        assert!(!is_rejected_content_type("application/pdf"));
        assert!(!is_rejected_content_type("application/zip"));
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), Some(".png"));
        assert_eq!(extension_for("image/jpeg"), Some(".jpg"));
        assert_eq!(extension_for("application/pdf"), Some(".pdf"));
        assert_eq!(extension_for("application/x-unknown-thing"), None);
    }

    #[test]
    fn test_classify_eligible() {
        let result = classify(200, Some("image/png"));
        assert_eq!(
            result,
            ProbeResult::Eligible {
                content_type: "image/png".to_string(),
                extension: Some(".png"),
            }
        );
    }

    #[test]
    fn test_classify_unmapped_is_eligible_without_extension() {
        let result = classify(200, Some("application/x-unknown-thing"));
        assert!(result.is_eligible());
        assert_eq!(result.extension(), None);
    }

    #[test]
    fn test_classify_bad_status() {
        let result = classify(404, Some("image/png"));
        assert!(!result.is_eligible());
        assert!(result.reason().unwrap().contains("404"));
    }

    #[test]
    fn test_classify_missing_or_bad_content_type() {
        assert!(!classify(200, None).is_eligible());
        assert!(!classify(200, Some("nonsense")).is_eligible());
    }

    #[test]
    fn test_classify_html_names_type() {
        let result = classify(200, Some("text/html; charset=utf-8"));
        assert!(!result.is_eligible());
        assert!(result.reason().unwrap().contains("text/html"));
    }
}
