//! Deterministic local file names
//!
//! A URL maps to `<crc32 as 8 hex digits><extension>`, e.g.
//! `414fa339.png`. The checksum only depends on the URL bytes, so the same
//! URL lands on the same file across runs and machines.

/// Derive the base name for a URL with the given extension
///
/// A missing leading dot on `extension` is added.
pub fn derive_name(url: &str, extension: &str) -> String {
    let checksum = crc32fast::hash(url.as_bytes());
    let ext = extension.trim();
    if ext.is_empty() || ext.starts_with('.') {
        format!("{checksum:08x}{ext}")
    } else {
        format!("{checksum:08x}.{ext}")
    }
}
