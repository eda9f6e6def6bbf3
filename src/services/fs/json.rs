//! Display schema for the tree view.
//!
//! Every node becomes `{ "type", "name", "size", "lastModified", "rows" }`.
//! Missing metadata is rendered as `""` so the schema never changes shape.

use std::collections::btree_map;

use serde_json::{json, Value};
use time::macros::format_description;
use time::UtcOffset;
use tracing::warn;

use super::tree::{DirectoryNode, FileSystemTree};
use crate::core::errors::Result;
use crate::models::file_entry::{EntryInfo, FileKind};

/// Deepest directory level (the start node is depth 0) whose `rows` are
/// emitted, whatever [`SerializeOptions::max_depth`] asks for. Deeper nesting
/// cannot be written or read back by `serde_json` on a default thread stack.
pub const MAX_NESTING: usize = 256;

/// Limits applied while serializing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Directories deeper than this (the start node is depth 0) are emitted
    /// with empty `rows`.
    pub max_depth: Option<usize>,
    /// Omit file rows.
    pub directories_only: bool,
}

impl SerializeOptions {
    /// One level of children, as requested when the UI expands a node.
    pub fn one_level() -> Self {
        Self {
            max_depth: Some(1),
            directories_only: false,
        }
    }

    fn expands(&self, depth: usize) -> bool {
        depth < MAX_NESTING && self.max_depth.map_or(true, |max| depth < max)
    }
}

/// Serializes the whole subtree under `node`, depth first.
pub fn to_json_value(node: &DirectoryNode) -> Value {
    to_json_value_with(node, &SerializeOptions::default())
}

pub fn to_json_value_with(node: &DirectoryNode, options: &SerializeOptions) -> Value {
    let mut stack = vec![Frame::open(node, 0, options)];
    let mut truncated = false;
    loop {
        let Some(top) = stack.last_mut() else {
            return Value::Null;
        };
        if let Some(child) = top.pending.as_mut().and_then(Iterator::next) {
            let depth = top.depth + 1;
            if depth == MAX_NESTING
                && child.child_count() > 0
                && options.max_depth.map_or(true, |max| max > MAX_NESTING)
            {
                truncated = true;
            }
            stack.push(Frame::open(child, depth, options));
            continue;
        }

        let Some(frame) = stack.pop() else {
            return Value::Null;
        };
        let value = frame.close(options);
        match stack.last_mut() {
            Some(parent) => parent.rows.push(value),
            None => {
                if truncated {
                    warn!(
                        start = node.name(),
                        max_nesting = MAX_NESTING,
                        "tree nests deeper than the serializer allows; deeper rows left empty"
                    );
                }
                return value;
            }
        }
    }
}

/// Compact text of the whole tree.
pub fn to_json(tree: &FileSystemTree) -> String {
    to_json_value(tree.root()).to_string()
}

pub fn to_json_pretty(tree: &FileSystemTree) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_json_value(tree.root()))?)
}

/// A directory whose subdirectory rows are still being collected.
struct Frame<'a> {
    node: &'a DirectoryNode,
    depth: usize,
    pending: Option<btree_map::Values<'a, String, DirectoryNode>>,
    rows: Vec<Value>,
}

impl<'a> Frame<'a> {
    fn open(node: &'a DirectoryNode, depth: usize, options: &SerializeOptions) -> Self {
        Self {
            node,
            depth,
            pending: options.expands(depth).then(|| node.directories.values()),
            rows: Vec::new(),
        }
    }

    fn close(self, options: &SerializeOptions) -> Value {
        let mut rows = self.rows;
        if self.pending.is_some() && !options.directories_only {
            rows.extend(self.node.files().map(file_value));
        }
        json!({
            "type": FileKind::Directory.as_str(),
            "name": self.node.name(),
            "size": "",
            "lastModified": last_modified(self.node.info()),
            "rows": rows,
        })
    }
}

fn file_value(entry: &EntryInfo) -> Value {
    json!({
        "type": entry.kind.as_str(),
        "name": entry.name(),
        "size": entry.size.map(|s| s.to_string()).unwrap_or_default(),
        "lastModified": last_modified(Some(entry)),
        "rows": [],
    })
}

fn last_modified(info: Option<&EntryInfo>) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    info.and_then(|i| i.modified)
        .and_then(|m| m.checked_to_offset(UtcOffset::UTC))
        .and_then(|m| m.format(format).ok())
        .unwrap_or_default()
}
