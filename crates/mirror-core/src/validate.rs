//! Allow-list checks for identifiers taken from upstream documents.
//!
//! Version keys, platform keys and artifact file names all end up as
//! path components under the storage root, so anything outside
//! `[A-Za-z0-9._-]` or containing `..` is refused before a path is built.

use url::Url;

/// Returns `true` if `name` must not be used as a path component.
///
/// # Examples
///
/// ```
/// use mirror_core::validate::is_unsafe_name;
///
/// assert!(!is_unsafe_name("132.1.0"));
/// assert!(!is_unsafe_name("linux-x64"));
/// assert!(is_unsafe_name("../etc"));
/// assert!(is_unsafe_name("a/b"));
/// ```
pub fn is_unsafe_name(name: &str) -> bool {
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return true;
    }
    name.contains("..")
}

/// Returns `true` if a file name extracted from a download URL must not be
/// written to disk.
pub fn is_unsafe_file_name(file_name: &str) -> bool {
    file_name.is_empty()
        || file_name.starts_with('/')
        || file_name.starts_with('\\')
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
}

/// Last path segment of `url`, without query or fragment.
///
/// Percent-escapes are kept as-is so an encoded separator can never turn
/// into a real one. Returns `None` if `url` does not parse or has no
/// path segments.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.last()?;
    Some(segment.to_string())
}
