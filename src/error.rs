// src/error.rs

use git2::{ErrorClass, ErrorCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Everything that can go wrong while reconstructing history.
///
/// `NotFound`, `Corrupt` and `Io` abort the whole operation. `Parse` is
/// only ever raised for a single file and is contained by the analyzer.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt history object: {0}")]
    Corrupt(String),

    #[error("object store read failed: {0}")]
    Io(String),

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}

impl HistoryError {
    pub fn parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        HistoryError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HistoryError::NotFound(_))
    }
}

impl From<git2::Error> for HistoryError {
    fn from(err: git2::Error) -> Self {
        let message = err.message().to_string();
        match err.code() {
            ErrorCode::NotFound | ErrorCode::InvalidSpec | ErrorCode::Ambiguous => {
                return HistoryError::NotFound(message)
            }
            _ => {}
        }
        match err.class() {
            ErrorClass::Os
            | ErrorClass::Filesystem
            | ErrorClass::Net
            | ErrorClass::Ssh
            | ErrorClass::Http => HistoryError::Io(message),
            ErrorClass::Odb
            | ErrorClass::Object
            | ErrorClass::Tree
            | ErrorClass::Zlib
            | ErrorClass::Index
            | ErrorClass::Reference => HistoryError::Corrupt(message),
            _ => HistoryError::Io(message),
        }
    }
}

impl From<std::io::Error> for HistoryError {
    fn from(err: std::io::Error) -> Self {
        HistoryError::Io(err.to_string())
    }
}
