//! Key path helpers
//!
//! Keys are plain strings with `/` as separator. The store only understands
//! whole-string prefixes, so every segment-aware rule lives here.

/// Zero-byte placeholder that keeps an otherwise empty directory listable
pub const KEEP_MARKER: &str = ".keep";

pub const SEPARATOR: char = '/';

/// Collapse duplicate, leading and trailing separators.
pub fn normalize(path: &str) -> String {
    path.split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a prefix and a child name. An empty prefix is the store root.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Parent prefix of a key; the root is the empty string.
pub fn parent(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last path segment.
pub fn file_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Key of the placeholder object for a directory.
pub fn keep_key(dir: &str) -> String {
    join(dir, KEEP_MARKER)
}

pub fn is_keep_marker(name: &str) -> bool {
    name == KEEP_MARKER
}

/// True when `path` lies strictly below `ancestor` on a segment boundary.
///
/// `a/bc` is not within `a/b`; `a/b` is not within itself.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Rewrite `key` from the `from` prefix onto the `to` prefix.
///
/// Returns `None` when `key` is neither `from` nor below it.
pub fn rebase(key: &str, from: &str, to: &str) -> Option<String> {
    if key == from {
        return Some(to.to_string());
    }
    if is_within(key, from) {
        let rest = &key[from.len()..];
        if to.is_empty() {
            return Some(rest.trim_start_matches(SEPARATOR).to_string());
        }
        return Some(format!("{}{}", to, rest));
    }
    None
}

/// Make a user-supplied name safe to use as a single path segment.
pub fn sanitize_name(name: &str) -> String {
    name.trim().replace(['/', '\\'], "_")
}
