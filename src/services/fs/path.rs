//! POSIX path helpers for remote paths.
//!
//! Remote paths are always `/`-separated regardless of the host platform, so
//! they are handled as strings rather than `std::path::Path`.

/// Normalizes an absolute path: collapses repeated slashes, drops `.`
/// segments, resolves `..` and strips any trailing slash except on `/`.
///
/// Returns `None` for relative or empty input.
pub fn normalize(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return None;
    }
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut out = String::with_capacity(path.len());
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    Some(out)
}

/// Appends one segment to a normalized directory path.
pub fn join(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Splits a normalized path into `(parent, leaf)`. `/` has no parent.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    let (parent, leaf) = path.rsplit_once('/')?;
    if leaf.is_empty() {
        return None;
    }
    Some((if parent.is_empty() { "/" } else { parent }, leaf))
}

/// Whether normalized `path` equals `root` or lies beneath it.
pub fn is_within(path: &str, root: &str) -> bool {
    if root == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Segments of normalized `path` below `root`, in order. The caller must
/// have checked [`is_within`].
pub fn segments_below<'a>(path: &'a str, root: &str) -> impl Iterator<Item = &'a str> {
    let rest = if root == "/" {
        path
    } else {
        &path[root.len()..]
    };
    rest.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_strips() {
        assert_eq!(normalize("/data//local/tmp/").as_deref(), Some("/data/local/tmp"));
        assert_eq!(normalize("/a/./b/../c").as_deref(), Some("/a/c"));
        assert_eq!(normalize("/..").as_deref(), Some("/"));
        assert_eq!(normalize("//").as_deref(), Some("/"));
        assert_eq!(normalize("/My Documents/x y").as_deref(), Some("/My Documents/x y"));
    }

    #[test]
    fn normalize_rejects_relative() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("data/x"), None);
        assert_eq!(normalize("./x"), None);
    }

    #[test]
    fn split_parent_handles_root_children() {
        assert_eq!(split_parent("/a"), Some(("/", "a")));
        assert_eq!(split_parent("/a/b c"), Some(("/a", "b c")));
        assert_eq!(split_parent("/"), None);
    }

    #[test]
    fn containment_is_segment_aware() {
        assert!(is_within("/data", "/data"));
        assert!(is_within("/data/x", "/data"));
        assert!(!is_within("/database", "/data"));
        assert!(is_within("/anything", "/"));
    }

    #[test]
    fn segments_below_root() {
        let segs: Vec<_> = segments_below("/data/a/b", "/data").collect();
        assert_eq!(segs, vec!["a", "b"]);
        let segs: Vec<_> = segments_below("/a/b", "/").collect();
        assert_eq!(segs, vec!["a", "b"]);
        assert_eq!(segments_below("/data", "/data").count(), 0);
    }
}
