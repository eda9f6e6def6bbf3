//! Remote filesystem snapshots: parsers for shell output, the tree they
//! build, and its display serialization.

mod builder;
pub mod find;
pub mod json;
pub mod listing;
pub mod path;
pub mod stat;
pub mod tree;

pub use find::parse_find_type_d;
pub use json::{to_json, to_json_pretty, to_json_value, to_json_value_with, SerializeOptions};
pub use listing::{parse_ls_lr, ListingFact};
pub use stat::parse_stat;
pub use tree::{Child, DirectoryNode, FileSystemTree, TreeStats};
