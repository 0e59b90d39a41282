//! Error types for the graph-loader crate.
//!
//! Every failure mode of loading a social graph fixture maps to one
//! variant so callers can tell a missing file apart from a malformed line
//! or a dangling edge.

use thiserror::Error;

/// Errors that can occur while loading and indexing a social graph.
#[derive(Error, Debug)]
pub enum GraphLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a fixture file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// An edge references a user that isn't in users.dat
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u64 },

    /// Two users share the same handle
    #[error("Duplicate username: {0}")]
    DuplicateUsername(String),

    /// A user follows, blocks or mutes themselves
    #[error("Self-referencing {kind} edge for user {id}")]
    SelfEdge { kind: String, id: u64 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, GraphLoadError>;
