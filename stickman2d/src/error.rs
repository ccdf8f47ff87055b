use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse document at byte {offset}: {message}")]
    ValueParse { message: String, offset: usize },

    #[error("missing required field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' must be {expected}")]
    InvalidField { field: String, expected: String },

    #[error("unknown animation: {name}")]
    UnknownAnimation { name: String },
}
