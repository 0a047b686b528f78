use std::fmt;

use strata_types::{Feature, FeatureId};
use strata_value::MergeConflict;

use crate::error::ErrorKind;

// ---------------------------------------------------------------------------
// WriteOutcome
// ---------------------------------------------------------------------------

/// The per-feature verdict of policy resolution.
///
/// Features inside effectful variants carry resolved content (properties
/// already patched or merged, geometry settled) but unstamped metadata;
/// the executor stamps version, timestamps, author, and uuids when it
/// stages the write. `Delete` and `TombstoneSet` carry the pre-image
/// instead, the state being removed.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOutcome {
    /// A new head for an id the write layer has never held.
    Insert(Feature),
    /// A replacement head over the current state.
    Update(Feature),
    /// Physical removal of the current row.
    Delete(Feature),
    /// Shadow marker over the id in the delta layer; the base row survives
    /// underneath but stops being visible through this space.
    TombstoneSet(Feature),
    /// Marker removed and a fresh row written in its place.
    TombstoneClear(Feature),
    /// Policy chose to leave the head exactly as it is.
    Noop,
    /// Policy rejected the write.
    Error(WriteError),
}

impl WriteOutcome {
    /// Returns `true` for the rejection variant.
    pub fn is_error(&self) -> bool {
        matches!(self, WriteOutcome::Error(_))
    }

    /// The feature this outcome writes or removes, if any.
    pub fn feature(&self) -> Option<&Feature> {
        match self {
            WriteOutcome::Insert(f)
            | WriteOutcome::Update(f)
            | WriteOutcome::Delete(f)
            | WriteOutcome::TombstoneSet(f)
            | WriteOutcome::TombstoneClear(f) => Some(f),
            WriteOutcome::Noop | WriteOutcome::Error(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// WriteError
// ---------------------------------------------------------------------------

/// A policy rejection: an expected, resolvable outcome, not a fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteError {
    pub kind: ErrorKind,
    pub message: String,
}

impl WriteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_exists(id: &FeatureId) -> Self {
        Self::new(
            ErrorKind::FeatureNotExists,
            format!("feature '{id}' does not exist"),
        )
    }

    pub fn exists(id: &FeatureId) -> Self {
        Self::new(
            ErrorKind::FeatureExists,
            format!("feature '{id}' already exists"),
        )
    }

    pub fn version_conflict(id: &FeatureId, supplied: u64, found: u64) -> Self {
        Self::new(
            ErrorKind::VersionConflict,
            format!("feature '{id}' is at version {found}, not {supplied}"),
        )
    }

    /// The supplied base version has no retained history state to merge from.
    pub fn ancestor_gone(id: &FeatureId, base_version: u64) -> Self {
        Self::new(
            ErrorKind::VersionConflict,
            format!("feature '{id}' has no history at version {base_version} to merge from"),
        )
    }

    pub fn merge_conflict(id: &FeatureId, conflicts: &[MergeConflict]) -> Self {
        let paths = conflicts
            .iter()
            .map(|c| c.path.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(
            ErrorKind::MergeConflict,
            format!("feature '{id}' has conflicting changes at {paths}"),
        )
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
