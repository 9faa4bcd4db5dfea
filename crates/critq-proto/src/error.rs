//! Protocol error types.

use thiserror::Error;

/// Errors raised while reading protocol values.
#[derive(Debug, Error)]
pub enum Error {
    /// A query definition could not be decoded.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Deserialization(err.to_string())
    }
}
