use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid root '{0}': expected an absolute path")]
    InvalidRoot(String),
    #[error("invalid path '{0}': expected a non-empty absolute path")]
    InvalidPath(String),
    #[error("path '{path}' is outside the tree root '{root}'")]
    OutsideRoot { path: String, root: String },
    #[error("no directory at '{0}'")]
    NotFound(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
