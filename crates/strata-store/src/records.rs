//! Storage records: layer rows, archived history, and the conditioned row
//! operations the write path stages against a layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use strata_types::{Feature, FeatureId, SpaceId};

/// An immutable snapshot of a committed feature state.
///
/// Keyed by `(space, feature id, version)`; once written it is never
/// modified. Merge resolution reads these to recover the ancestor a
/// client's stale write was based on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub space: SpaceId,
    pub feature: Feature,
}

impl HistoryRecord {
    /// Snapshot `feature` as it stood when archived.
    pub fn new(space: SpaceId, feature: Feature) -> Self {
        Self { space, feature }
    }

    /// The archived state's version.
    pub fn version(&self) -> u64 {
        self.feature.meta.version
    }
}

/// What a single layer holds for a feature id.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerRow {
    /// A live feature state.
    Live(Feature),
    /// A shadow marker: the id is deleted in this layer, hiding any base
    /// row underneath.
    Tombstone,
    /// The layer has no row and no marker for this id.
    Absent,
}

impl LayerRow {
    /// Returns `true` for a live row.
    pub fn is_live(&self) -> bool {
        matches!(self, LayerRow::Live(_))
    }

    /// Returns `true` for a shadow marker.
    pub fn is_tombstone(&self) -> bool {
        matches!(self, LayerRow::Tombstone)
    }

    /// The live feature, if any.
    pub fn live(&self) -> Option<&Feature> {
        match self {
            LayerRow::Live(f) => Some(f),
            _ => None,
        }
    }

    /// Short description for race reporting.
    pub fn describe(&self) -> String {
        match self {
            LayerRow::Live(f) => format!("version {}", f.meta.version),
            LayerRow::Tombstone => "tombstone".to_string(),
            LayerRow::Absent => "absent".to_string(),
        }
    }
}

/// A layer read result: the row plus the layer's version watermark.
///
/// The watermark is the highest version ever stamped for this id in this
/// layer. It survives physical deletes, which keeps history keys unique
/// when an id is deleted and later re-created.
#[derive(Clone, Debug, PartialEq)]
pub struct RowState {
    pub row: LayerRow,
    pub watermark: u64,
}

impl RowState {
    /// A state for an id the layer has never seen.
    pub fn absent() -> Self {
        Self {
            row: LayerRow::Absent,
            watermark: 0,
        }
    }
}

/// The layer state a conditioned write expects to still hold at commit.
///
/// Captured during resolution and re-validated inside `apply`; any
/// difference means another writer got there first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Precondition {
    /// No live row, no marker, watermark unchanged.
    NoRow { watermark: u64 },
    /// A shadow marker is present, watermark unchanged.
    Tombstone { watermark: u64 },
    /// A live row at exactly this version.
    Version(u64),
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::NoRow { watermark } => write!(f, "no row (watermark {})", watermark),
            Precondition::Tombstone { watermark } => {
                write!(f, "tombstone (watermark {})", watermark)
            }
            Precondition::Version(v) => write!(f, "version {}", v),
        }
    }
}

/// One mutation staged against a layer.
///
/// All ops in a batch are validated against the state at apply start and
/// then applied together; see [`FeatureStore::apply`](crate::FeatureStore::apply).
#[derive(Clone, Debug, PartialEq)]
pub enum RowOp {
    /// Write a live row. Clears any shadow marker for the id; the row and
    /// the marker are mutually exclusive.
    Put {
        feature: Feature,
        expected: Precondition,
    },
    /// Physically remove a live row.
    Delete { id: FeatureId, expected: u64 },
    /// Replace whatever the layer holds for the id with a shadow marker.
    SetTombstone {
        id: FeatureId,
        expected: Precondition,
    },
    /// Append an immutable history snapshot.
    Archive { record: HistoryRecord },
}

impl RowOp {
    /// The feature id this op touches.
    pub fn feature_id(&self) -> &FeatureId {
        match self {
            RowOp::Put { feature, .. } => &feature.id,
            RowOp::Delete { id, .. } => id,
            RowOp::SetTombstone { id, .. } => id,
            RowOp::Archive { record } => &record.feature.id,
        }
    }
}
