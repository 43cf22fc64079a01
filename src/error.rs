//! Error types for opening macro, script and session files

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::host::HostError;

#[derive(Error, Debug)]
pub enum OpenError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed input: {0}")]
    Format(#[from] FormatError),

    #[error("No macro definitions found in {}", .0.display())]
    NoMacrosFound(PathBuf),

    #[error("No \"command\" was found in {}", .0.display())]
    MissingCommand(PathBuf),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Content that does not follow the key-value or macro key syntax
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("line {line}: expected `key {separator} value`")]
    MissingSeparator { line: usize, separator: char },

    #[error("line {line}: empty key")]
    EmptyKey { line: usize },

    #[error("invalid macro key {key:?}: {reason}")]
    InvalidMacroKey { key: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, OpenError>;
