use strata_types::{FeatureId, Space, SpaceId};

use crate::error::StoreResult;
use crate::records::{HistoryRecord, RowOp, RowState};

/// One layer of versioned feature rows per space.
///
/// All implementations must satisfy these invariants:
/// - `read_row` reports exactly what the named layer holds: a live row,
///   a shadow marker, or nothing. Layer composition is the caller's job.
/// - The watermark in a returned [`RowState`] never decreases across
///   reads of the same id.
/// - A batch `apply` is atomic: every op's precondition is validated
///   against the layer state as of the start of the call, and either all
///   ops land or none do.
/// - Reads never mutate anything; concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
pub trait FeatureStore: Send + Sync {
    /// Read the row state for `id` in the layer owned by `space`.
    ///
    /// An id the layer has never seen reads as
    /// [`RowState::absent`](crate::RowState::absent).
    fn read_row(&self, space: &SpaceId, id: &FeatureId) -> StoreResult<RowState>;

    /// Read the archived snapshot of `id` at exactly `version`.
    ///
    /// Returns `Ok(None)` when no record exists, including when retention
    /// has purged it.
    fn read_history(
        &self,
        space: &SpaceId,
        id: &FeatureId,
        version: u64,
    ) -> StoreResult<Option<HistoryRecord>>;

    /// Apply a batch of row operations to the layer owned by `space`,
    /// atomically.
    ///
    /// If any precondition check fails, nothing is applied and the first
    /// failure is returned. The caller may re-run resolution and retry
    /// the whole batch.
    fn apply(&self, space: &SpaceId, ops: &[RowOp]) -> StoreResult<()>;
}

/// Lookup of space descriptors.
pub trait SpaceDirectory: Send + Sync {
    /// The descriptor for `id`, or `Ok(None)` if no such space exists.
    fn space(&self, id: &SpaceId) -> StoreResult<Option<Space>>;
}
