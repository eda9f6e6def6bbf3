//! Insertion primitives. These are the only ways a [`FileSystemTree`] changes.
//!
//! When one name is reported both as a file and as a directory, the
//! directory wins regardless of insertion order.

use tracing::debug;

use super::listing::ListingFact;
use super::path;
use super::tree::{DirectoryNode, FileSystemTree};
use crate::core::errors::{Error, Result};
use crate::models::file_entry::EntryInfo;

impl DirectoryNode {
    fn ensure_directory(&mut self, name: &str) -> &mut DirectoryNode {
        if self.files.remove(name).is_some() {
            debug!(parent = %self.name, name, "directory replaces file of the same name");
        }
        self.directories
            .entry(name.to_string())
            .or_insert_with(|| DirectoryNode::synthesized(name))
    }
}

impl FileSystemTree {
    /// Returns the directory at `path`, creating it and any missing
    /// ancestors as synthesized directories.
    ///
    /// Calling this again with the same path returns the same node.
    pub fn resolve_or_create(&mut self, path: &str) -> Result<&DirectoryNode> {
        self.resolve_or_create_mut(path).map(|node| &*node)
    }

    /// Inserts one entry below its parent directory.
    ///
    /// Directory entries attach their metadata to the (possibly existing)
    /// node at their path. Anything else becomes a file child, replacing a
    /// previous file of the same name.
    pub fn add_entry(&mut self, entry: EntryInfo) -> Result<()> {
        let normalized = self.checked_path(&entry.path)?;
        let entry = EntryInfo {
            path: normalized,
            ..entry
        };

        if entry.kind.is_dir() {
            let node = self.resolve_or_create_mut(&entry.path)?;
            node.info = Some(entry);
            return Ok(());
        }

        if entry.path == self.root_path {
            debug!(path = %entry.path, kind = entry.kind.as_str(), "root stays a directory");
            return Ok(());
        }
        let Some((parent, name)) = path::split_parent(&entry.path) else {
            return Err(Error::InvalidPath(entry.path.clone()));
        };
        let name = name.to_string();
        let node = self.resolve_or_create_mut(parent)?;
        if node.directories.contains_key(&name) {
            debug!(path = %entry.path, "dropping file shadowed by a directory");
            return Ok(());
        }
        node.files.insert(name, entry);
        Ok(())
    }

    pub(super) fn resolve_or_create_mut(&mut self, path: &str) -> Result<&mut DirectoryNode> {
        let target = self.checked_path(path)?;
        let segments: Vec<&str> = path::segments_below(&target, &self.root_path).collect();
        let mut node = &mut self.root;
        for segment in segments {
            node = node.ensure_directory(segment);
        }
        Ok(node)
    }

    /// Applies one parsed `ls -lR` fact. Never fails; bad facts are logged.
    pub(super) fn insert_fact(&mut self, fact: ListingFact) {
        let outcome = match fact {
            ListingFact::Directory { path } => self.resolve_or_create_mut(&path).map(|_| ()),
            ListingFact::Child {
                directory,
                name,
                kind,
                size,
                permissions,
                modified,
            } => {
                let entry = EntryInfo {
                    size,
                    permissions,
                    modified,
                    ..EntryInfo::new(path::join(&directory, &name), kind)
                };
                self.add_entry(entry)
            }
        };
        if let Err(err) = outcome {
            debug!(error = %err, "skipping listing fact");
        }
    }

    fn checked_path(&self, raw: &str) -> Result<String> {
        let normalized = path::normalize(raw).ok_or_else(|| Error::InvalidPath(raw.to_string()))?;
        if !path::is_within(&normalized, &self.root_path) {
            return Err(Error::OutsideRoot {
                path: normalized,
                root: self.root_path.clone(),
            });
        }
        Ok(normalized)
    }
}
