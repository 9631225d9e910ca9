//! Error type for writing out a compiled module.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeGenError {
    /// The textual IR could not be written to `path`.
    #[error("failed to write '{path}': {source}")]
    Write { path: String, #[source] source: std::io::Error },
}

pub type Result<T> = std::result::Result<T, CodeGenError>;
