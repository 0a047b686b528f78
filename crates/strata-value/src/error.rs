//! Error types for the value crate.

use crate::path::Path;

/// Errors raised when a diff cannot be applied to a base value.
///
/// A diff computed against the value it is applied to always fits; these
/// errors signal a corrupt or mismatched change set, which callers treat
/// as an implementation fault rather than a data conflict.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The path names a location the base value does not have.
    #[error("no value at {path} to patch")]
    MissingPath { path: Path },

    /// An array operation targets an index past the writable range.
    #[error("index {index} out of bounds at {path} (length {len})")]
    OutOfBounds { path: Path, index: usize, len: usize },

    /// A path step descends into a value of the wrong shape, such as an
    /// index step meeting an object.
    #[error("path shape does not match value shape at {path}")]
    ShapeMismatch { path: Path },

    /// One entry's path is an ancestor of another entry's path, so the
    /// application order would be ambiguous.
    #[error("overlapping diff paths at {path}")]
    OverlappingPaths { path: Path },

    /// The change set asks to remove the document root.
    #[error("cannot remove the document root")]
    RemoveRoot,
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
