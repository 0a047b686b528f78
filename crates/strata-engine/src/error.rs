use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use strata_store::StoreError;
use strata_types::{FeatureId, SpaceId};

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// The closed set of failure kinds surfaced to callers, serialized by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The targeted feature has no current head.
    FeatureNotExists,
    /// The targeted feature already has a head.
    FeatureExists,
    /// The supplied base version does not match the current head.
    VersionConflict,
    /// A three-way merge found colliding changes.
    MergeConflict,
    /// Storage fault or lost write race; the batch is retryable as a whole.
    StorageTransient,
    /// The request itself is malformed.
    InvalidRequest,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::FeatureNotExists => "FeatureNotExists",
            ErrorKind::FeatureExists => "FeatureExists",
            ErrorKind::VersionConflict => "VersionConflict",
            ErrorKind::MergeConflict => "MergeConflict",
            ErrorKind::StorageTransient => "StorageTransient",
            ErrorKind::InvalidRequest => "InvalidRequest",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// A per-item failure reported inside a batch result.
///
/// Violations carry policy rejections and per-item validation failures.
/// They never carry storage faults; those abort the whole batch and are
/// reported as [`BatchError`] instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Position of the failed item in the request.
    pub index: usize,
    /// The targeted feature, when the item named one.
    pub feature: Option<FeatureId>,
    pub kind: ErrorKind,
    pub message: String,
}

impl Violation {
    pub fn new(
        index: usize,
        feature: Option<FeatureId>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            feature,
            kind,
            message: message.into(),
        }
    }

    /// An `InvalidRequest` violation, the kind every validation failure uses.
    pub fn invalid(index: usize, feature: Option<FeatureId>, message: impl Into<String>) -> Self {
        Self::new(index, feature, ErrorKind::InvalidRequest, message)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {}: {}: {}", self.index, self.kind, self.message)
    }
}

// ---------------------------------------------------------------------------
// BatchError
// ---------------------------------------------------------------------------

/// A whole-batch failure. Nothing has been committed when one is returned.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The request named a space the directory does not know.
    #[error("space not found: {0}")]
    SpaceNotFound(SpaceId),

    /// The space rejects all writes.
    #[error("space is read-only: {0}")]
    ReadOnlySpace(SpaceId),

    /// A transactional batch hit a logical conflict and was abandoned.
    #[error("batch aborted: {violation}")]
    Aborted { index: usize, violation: Violation },

    /// Storage fault; the caller may retry the whole batch.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// The caller-supplied timeout expired; treated like a storage fault.
    #[error("batch deadline exceeded")]
    DeadlineExceeded,

    /// Invariant violation inside the engine. Not a policy outcome and
    /// never downgraded to a violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BatchError {
    /// The [`ErrorKind`] this failure serializes as.
    ///
    /// `Internal` reports as `StorageTransient`: a server-side fault,
    /// not something the caller's request or policy caused.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BatchError::SpaceNotFound(_) | BatchError::ReadOnlySpace(_) => {
                ErrorKind::InvalidRequest
            }
            BatchError::Aborted { violation, .. } => violation.kind,
            BatchError::Storage(_) | BatchError::DeadlineExceeded | BatchError::Internal(_) => {
                ErrorKind::StorageTransient
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_serializes_by_name() {
        let json = serde_json::to_string(&ErrorKind::FeatureNotExists).unwrap();
        assert_eq!(json, "\"FeatureNotExists\"");
        let parsed: ErrorKind = serde_json::from_str("\"MergeConflict\"").unwrap();
        assert_eq!(parsed, ErrorKind::MergeConflict);
    }

    #[test]
    fn violation_display() {
        let violation = Violation::new(
            2,
            Some(FeatureId::from("f-1")),
            ErrorKind::VersionConflict,
            "feature 'f-1' is at version 4, not 2",
        );
        assert_eq!(
            violation.to_string(),
            "item 2: VersionConflict: feature 'f-1' is at version 4, not 2"
        );
    }

    #[test]
    fn batch_error_kinds() {
        assert_eq!(
            BatchError::SpaceNotFound(SpaceId::from("x")).kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(BatchError::DeadlineExceeded.kind(), ErrorKind::StorageTransient);
        assert_eq!(
            BatchError::Internal("bad branch".into()).kind(),
            ErrorKind::StorageTransient
        );
        let aborted = BatchError::Aborted {
            index: 0,
            violation: Violation::invalid(0, None, "empty id"),
        };
        assert_eq!(aborted.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn store_error_converts() {
        let err = BatchError::from(StoreError::Unavailable("offline".into()));
        assert!(matches!(err, BatchError::Storage(_)));
        assert_eq!(err.kind(), ErrorKind::StorageTransient);
    }
}
