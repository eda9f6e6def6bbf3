//! Parser for directory-only listings (`find <root> -type d`).

use tracing::debug;

use super::path;

/// Returns every directory path in `text` that lies at or below `root`,
/// normalized and in input order. Duplicates are kept.
pub fn parse_find_type_d(root: &str, text: &str) -> Vec<String> {
    let Some(root) = path::normalize(root) else {
        debug!(root, "find root is not absolute");
        return Vec::new();
    };

    text.lines()
        .filter_map(|raw| {
            let line = raw.trim_end_matches('\r').trim_start();
            if line.trim().is_empty() || line.starts_with("find:") {
                return None;
            }
            match path::normalize(line) {
                Some(dir) if path::is_within(&dir, &root) => Some(dir),
                _ => {
                    debug!(line, "skipping find line");
                    None
                }
            }
        })
        .collect()
}
