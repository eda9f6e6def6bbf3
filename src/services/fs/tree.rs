//! The assembled remote directory tree and its construction strategies.
//!
//! Each constructor produces one static snapshot from one batch of remote
//! output. The three text/entry sources trade fidelity for cost:
//!
//! * [`FileSystemTree::from_entries`] keeps full per-entry metadata,
//! * [`FileSystemTree::from_ls_lr`] gets names, sizes and modes in one listing,
//! * [`FileSystemTree::from_find_type_d`] gets directories only.

use std::collections::{BTreeMap, VecDeque};

use serde_json::Value;
use tracing::{debug, info};

use super::json::{self, SerializeOptions};
use super::path;
use super::{find, listing, stat};
use crate::core::errors::{Error, Result};
use crate::models::file_entry::{EntryInfo, FileKind};

/// A directory in the tree.
///
/// `info` is `None` for synthesized directories that were only inferred from
/// a deeper path and never listed themselves. A node knows only its own
/// name; its absolute path is its position below the tree root.
#[derive(Debug)]
pub struct DirectoryNode {
    pub(super) name: String,
    pub(super) info: Option<EntryInfo>,
    pub(super) directories: BTreeMap<String, DirectoryNode>,
    pub(super) files: BTreeMap<String, EntryInfo>,
}

impl DirectoryNode {
    pub(super) fn synthesized(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info: None,
            directories: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> Option<&EntryInfo> {
        self.info.as_ref()
    }

    pub fn is_synthesized(&self) -> bool {
        self.info.is_none()
    }

    /// Subdirectories in name order.
    pub fn directories(&self) -> impl Iterator<Item = &DirectoryNode> {
        self.directories.values()
    }

    /// Non-directory children in name order.
    pub fn files(&self) -> impl Iterator<Item = &EntryInfo> {
        self.files.values()
    }

    pub fn directory(&self, name: &str) -> Option<&DirectoryNode> {
        self.directories.get(name)
    }

    pub fn file(&self, name: &str) -> Option<&EntryInfo> {
        self.files.get(name)
    }

    /// All direct children, subdirectories first.
    pub fn children(&self) -> impl Iterator<Item = Child<'_>> {
        self.directories
            .values()
            .map(Child::Directory)
            .chain(self.files.values().map(Child::File))
    }

    pub fn child_count(&self) -> usize {
        self.directories.len() + self.files.len()
    }
}

// Flattens the subtree before dropping it so a single very deep path cannot
// exhaust the stack through nested drop glue.
impl Drop for DirectoryNode {
    fn drop(&mut self) {
        let mut pending: Vec<DirectoryNode> =
            std::mem::take(&mut self.directories).into_values().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(std::mem::take(&mut node.directories).into_values());
        }
    }
}

/// A borrowed direct child of a [`DirectoryNode`].
#[derive(Debug, Clone, Copy)]
pub enum Child<'a> {
    Directory(&'a DirectoryNode),
    File(&'a EntryInfo),
}

impl<'a> Child<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            Child::Directory(node) => node.name(),
            Child::File(entry) => entry.name(),
        }
    }

    pub fn kind(&self) -> FileKind {
        match *self {
            Child::Directory(_) => FileKind::Directory,
            Child::File(entry) => entry.kind,
        }
    }

    /// Metadata, if the source reported any.
    pub fn info(&self) -> Option<&'a EntryInfo> {
        match *self {
            Child::Directory(node) => node.info(),
            Child::File(entry) => Some(entry),
        }
    }
}

/// Node counts of a tree. `directories` includes the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub directories: usize,
    pub files: usize,
    pub synthesized: usize,
}

/// A directory tree rooted at an absolute remote path.
#[derive(Debug)]
pub struct FileSystemTree {
    pub(super) root_path: String,
    pub(super) root: DirectoryNode,
}

impl FileSystemTree {
    /// Creates an empty tree. Fails if `root` is not absolute.
    pub fn new(root: &str) -> Result<Self> {
        let root_path = path::normalize(root).ok_or_else(|| Error::InvalidRoot(root.to_string()))?;
        let name = path::split_parent(&root_path)
            .map(|(_, leaf)| leaf.to_string())
            .unwrap_or_else(|| "/".to_string());
        Ok(Self {
            root: DirectoryNode::synthesized(name),
            root_path,
        })
    }

    /// Builds a tree from individually stat'd entries, keeping their metadata.
    ///
    /// Any entry with a malformed or out-of-root path aborts the build.
    pub fn from_entries<I>(root: &str, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = EntryInfo>,
    {
        let mut tree = Self::new(root)?;
        for entry in entries {
            tree.add_entry(entry)?;
        }
        tree.log_built("entries");
        Ok(tree)
    }

    /// Builds a tree from `ls -lR` output. Unparseable lines are skipped.
    pub fn from_ls_lr(root: &str, text: &str) -> Result<Self> {
        let mut tree = Self::new(root)?;
        for fact in listing::parse_ls_lr(tree.root_path(), text) {
            tree.insert_fact(fact);
        }
        tree.log_built("ls -lR");
        Ok(tree)
    }

    /// Builds a directory-only tree from `find <root> -type d` output.
    pub fn from_find_type_d(root: &str, text: &str) -> Result<Self> {
        let mut tree = Self::new(root)?;
        for dir in find::parse_find_type_d(tree.root_path(), text) {
            if let Err(err) = tree.resolve_or_create_mut(&dir) {
                debug!(path = %dir, error = %err, "skipping find path");
            }
        }
        tree.log_built("find -type d");
        Ok(tree)
    }

    /// Builds a tree from `stat -c "%i|%A|%Z|%Y|%X|%U|%G|%s|%N"` output.
    ///
    /// Entries outside the root are skipped rather than rejected.
    pub fn from_stat_output(root: &str, text: &str) -> Result<Self> {
        let mut tree = Self::new(root)?;
        for entry in stat::parse_stat(text) {
            let path = entry.path.clone();
            if let Err(err) = tree.add_entry(entry) {
                debug!(path = %path, error = %err, "skipping stat entry");
            }
        }
        tree.log_built("stat");
        Ok(tree)
    }

    pub fn root(&self) -> &DirectoryNode {
        &self.root
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Looks up the directory at `path`.
    pub fn directory(&self, path: &str) -> Option<&DirectoryNode> {
        let target = path::normalize(path)?;
        if !path::is_within(&target, &self.root_path) {
            return None;
        }
        let mut node = &self.root;
        for segment in path::segments_below(&target, &self.root_path) {
            node = node.directories.get(segment)?;
        }
        Some(node)
    }

    /// Looks up the non-directory entry at `path`.
    pub fn file(&self, path: &str) -> Option<&EntryInfo> {
        let target = path::normalize(path)?;
        let (parent, name) = path::split_parent(&target)?;
        self.directory(parent)?.file(name)
    }

    /// Direct children of the directory at `path`, subdirectories first.
    pub fn list_children(&self, path: &str) -> Vec<Child<'_>> {
        self.directory(path)
            .map(|node| node.children().collect())
            .unwrap_or_default()
    }

    /// Every directory below `path`, breadth first, with its child count.
    pub fn folder_paths(&self, path: &str) -> Vec<(String, usize)> {
        let mut result = Vec::new();
        let (Some(start), Some(start_path)) = (self.directory(path), path::normalize(path)) else {
            return result;
        };
        let mut queue: VecDeque<(&DirectoryNode, String)> = VecDeque::from([(start, start_path)]);
        while let Some((node, node_path)) = queue.pop_front() {
            for child in node.directories.values() {
                let child_path = path::join(&node_path, &child.name);
                result.push((child_path.clone(), child.child_count()));
                queue.push_back((child, child_path));
            }
        }
        result
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        let mut pending = vec![&self.root];
        while let Some(node) = pending.pop() {
            stats.directories += 1;
            stats.files += node.files.len();
            if node.info.is_none() {
                stats.synthesized += 1;
            }
            pending.extend(node.directories.values());
        }
        stats
    }

    /// Serializes the directory at `path`, or `None` if there is none.
    pub fn subtree_json(&self, path: &str, options: &SerializeOptions) -> Option<Value> {
        self.directory(path)
            .map(|node| json::to_json_value_with(node, options))
    }

    fn log_built(&self, strategy: &str) {
        let stats = self.stats();
        info!(
            strategy,
            root = %self.root_path,
            directories = stats.directories,
            files = stats.files,
            synthesized = stats.synthesized,
            "built filesystem tree"
        );
    }
}
