//! Path splitting and handler key matching.
//!
//! A registration key is either exact (`"foo"`), matching one path
//! segment with nothing after it, or a prefix (`"foo/"`), matching one
//! segment followed by more path. [`handler_key`] turns a path into the
//! one key form that can match it, so a lookup is a single map probe.

use pkgstore_domain::{is_known_series, parse_reference, DomainResult, EntityRef};

/// Returns the path element starting at byte offset `start`, skipping one
/// leading `/`, and the offset of the `/` that ends it (or the path
/// length).
pub fn split_path(path: &str, start: usize) -> (&str, usize) {
    let mut start = start.min(path.len());
    if path[start..].starts_with('/') {
        start += 1;
    }
    match path[start..].find('/') {
        Some(len) => (&path[start..start + len], start + len),
        None => (&path[start..], path.len()),
    }
}

/// Returns the handler key for `path` and the path that remains after it.
///
/// When anything other than a lone trailing `/` follows the first
/// element, the key is the element plus `/` and the rest starts at the
/// following `/`. Otherwise the key is the bare element and the rest is
/// empty.
pub fn handler_key(path: &str) -> (String, &str) {
    let (key, end) = split_path(path, 0);
    if end + 1 < path.len() {
        (format!("{key}/"), &path[end..])
    } else {
        (key.to_string(), "")
    }
}

/// Splits a leading entity reference off `path`.
///
/// The reference is `[~owner/][series/]name[-revision]`, where the series
/// element is only consumed when it names a known series. The remaining
/// path is empty or starts with `/`.
pub fn split_id(path: &str) -> DomainResult<(EntityRef, &str)> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let (mut part, mut end) = split_path(path, 0);
    if part.starts_with('~') {
        (part, end) = split_path(path, end);
    }
    if is_known_series(part) {
        (_, end) = split_path(path, end);
    }
    let id = parse_reference(&path[..end])?;
    Ok((id, &path[end..]))
}
