//! Reconstructs a navigable directory tree of a remote device from the text
//! its shell prints (`ls -lR`, `find -type d`, `stat`) and serializes any
//! subtree for a tree view.

pub mod core;
pub mod models;
pub mod services;

pub use crate::core::errors::{Error, Result};
pub use crate::models::file_entry::{EntryInfo, FileKind, Permissions};
pub use crate::services::fs::{
    to_json, to_json_value, DirectoryNode, FileSystemTree, SerializeOptions,
};
