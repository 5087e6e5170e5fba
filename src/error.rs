//! Error taxonomy for the wrapping engine.
//!
//! Per-file failures (`Read`, `Parse`, `Transform`, `Write`) become an error
//! outcome on that file's result and never stop the run. `Configuration` is
//! fatal and is raised before any file is dispatched.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrapError {
    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to transform {}: {message}", path.display())]
    Transform { path: PathBuf, message: String },

    #[error("failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Coarse error category, used for grouping in run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    Read,
    Parse,
    Transform,
    Write,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Read => "read",
            ErrorKind::Parse => "parse",
            ErrorKind::Transform => "transform",
            ErrorKind::Write => "write",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl WrapError {
    pub fn read(path: &Path, err: impl ToString) -> Self {
        WrapError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn parse(path: &Path, err: impl ToString) -> Self {
        WrapError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn transform(path: &Path, err: impl ToString) -> Self {
        WrapError::Transform {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn write(path: &Path, err: impl ToString) -> Self {
        WrapError::Write {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WrapError::Read { .. } => ErrorKind::Read,
            WrapError::Parse { .. } => ErrorKind::Parse,
            WrapError::Transform { .. } => ErrorKind::Transform,
            WrapError::Write { .. } => ErrorKind::Write,
            WrapError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// The file this error belongs to, if it is a per-file error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            WrapError::Read { path, .. }
            | WrapError::Parse { path, .. }
            | WrapError::Transform { path, .. }
            | WrapError::Write { path, .. } => Some(path),
            WrapError::Configuration(_) => None,
        }
    }

    /// The underlying message without the path prefix.
    pub fn message(&self) -> &str {
        match self {
            WrapError::Read { message, .. }
            | WrapError::Parse { message, .. }
            | WrapError::Transform { message, .. }
            | WrapError::Write { message, .. } => message,
            WrapError::Configuration(message) => message,
        }
    }
}
