//! Error types for the store crate.

use strata_types::FeatureId;

use crate::records::Precondition;

/// Errors raised by storage backends.
///
/// Every variant is transient from the write path's point of view: the
/// batch that hit it was rolled back and may be retried from resolution.
/// None of these ever turns into a per-feature policy outcome.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A conditioned write found the row in a different state than the
    /// one observed at resolution time.
    #[error("version race on {id}: expected {expected}, found {found}")]
    VersionRace {
        id: FeatureId,
        expected: Precondition,
        found: String,
    },

    /// An archive op would overwrite an existing history record. History
    /// keys are immutable; hitting this means version stamping broke.
    #[error("history already holds {id} at version {version}")]
    HistoryCollision { id: FeatureId, version: u64 },

    /// The backend cannot currently serve requests.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
