//! Utilities for slash-separated absolute node paths.
//!
//! Every store API in this crate traffics in plain `&str` paths of the form
//! `/a/b/c`, with `/` denoting the workspace root. Relative paths are either
//! empty (the base itself) or start with a `/`.

/// The workspace root path.
pub const ROOT: &str = "/";

pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Join a base path with either a single segment or a `/`-prefixed relative
/// path. An empty `rel` returns the base unchanged.
pub fn join(base: &str, rel: &str) -> String {
    if rel.is_empty() {
        return base.to_string();
    }
    let base = if is_root(base) { "" } else { base };
    if rel.starts_with('/') {
        format!("{base}{rel}")
    } else {
        format!("{base}/{rel}")
    }
}

/// Parent of an absolute path; `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of an absolute path; empty for the root.
pub fn leaf(path: &str) -> &str {
    if is_root(path) {
        return "";
    }
    path.rsplit('/').next().unwrap_or("")
}

/// The part of `path` below `base`: empty if equal, `/`-prefixed otherwise,
/// `None` if `path` does not lie under `base`.
pub fn relative_to<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    if base == path {
        return Some("");
    }
    if is_root(base) {
        return path.starts_with('/').then_some(path);
    }
    let rest = path.strip_prefix(base)?;
    rest.starts_with('/').then_some(rest)
}

/// Parent portion of a `/`-prefixed relative path: `/b/c` -> `/b`, `/b` -> ``.
pub fn relative_parent(rel: &str) -> &str {
    match rel.rfind('/') {
        Some(idx) => &rel[..idx],
        None => "",
    }
}

/// Non-empty segments of a path, in order.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Sort key implementing the case-insensitive path ordering used when
/// sequencing transfer units.
pub fn ordering_key(path: &str) -> String {
    path.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/a", "b"), "/a/b");
        assert_eq!(join("/a", "/b/c"), "/a/b/c");
        assert_eq!(join("/", "/a/b"), "/a/b");
        assert_eq!(join("/a", ""), "/a");
        assert_eq!(join("/", ""), "/");
    }

    #[test]
    fn test_parent_and_leaf() {
        assert_eq!(parent("/a/b"), Some("/a"));
        assert_eq!(parent("/a"), Some("/"));
        assert_eq!(parent("/"), None);
        assert_eq!(leaf("/a/b"), "b");
        assert_eq!(leaf("/a"), "a");
        assert_eq!(leaf("/"), "");
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(relative_to("/a", "/a/b/c"), Some("/b/c"));
        assert_eq!(relative_to("/a", "/a"), Some(""));
        assert_eq!(relative_to("/", "/a"), Some("/a"));
        // no partial-segment matches
        assert_eq!(relative_to("/a", "/ab/c"), None);
        assert_eq!(relative_to("/a/b", "/a"), None);
    }

    #[test]
    fn test_relative_parent() {
        assert_eq!(relative_parent("/b/c"), "/b");
        assert_eq!(relative_parent("/b"), "");
        assert_eq!(relative_parent(""), "");
    }

    #[test]
    fn test_segments() {
        let segs: Vec<&str> = segments("/a/b/c").collect();
        assert_eq!(segs, vec!["a", "b", "c"]);
        assert_eq!(segments("/").count(), 0);
    }
}
