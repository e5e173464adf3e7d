//! Custom error types for the dictconv crate.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all conversion operations in this crate.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// An error originating from the SQLite index store.
    #[error("index store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An error originating from zip archive handling.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A binary index is corrupt or truncated.
    #[error("malformed index: {0}")]
    MalformedIndex(String),

    /// The index references a content chunk absent from the extracted set.
    #[error("missing content chunk {0}")]
    MissingChunk(u32),

    /// The entry parser failed its validation probe and cannot be used.
    #[error("entry parser unusable: {0}")]
    ParserUnavailable(String),

    /// An external tool is absent or returned a nonzero exit status.
    #[error("external tool '{tool}' failed: {reason}")]
    ExternalTool { tool: String, reason: String },

    /// An expected input file is absent, even after attempting on-the-fly
    /// decompression of its compressed sibling.
    #[error("source file not found: {0}")]
    SourceNotFound(PathBuf),

    /// A metadata file exists but cannot be used (wrong or missing fields).
    #[error("bad metadata in {path}: {reason}")]
    BadMetadata { path: PathBuf, reason: String },
}

/// A convenience `Result` type alias using the crate's `ConvertError` type.
pub type Result<T> = std::result::Result<T, ConvertError>;
