pub mod file_entry;

pub use file_entry::{EntryInfo, FileKind, Permissions};
