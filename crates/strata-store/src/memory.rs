use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use strata_types::{Feature, FeatureId, Space, SpaceId};

use crate::error::{StoreError, StoreResult};
use crate::records::{HistoryRecord, LayerRow, Precondition, RowOp, RowState};
use crate::traits::{FeatureStore, SpaceDirectory};

/// In-memory, per-space feature store.
///
/// Intended for tests and embedding. Each space's layer state lives behind
/// one `RwLock`, so a batch `apply` is naturally atomic: preconditions are
/// validated against the state at entry and the mutations land together or
/// not at all. Rows are cloned on read.
pub struct InMemoryFeatureStore {
    spaces: RwLock<HashMap<SpaceId, SpaceState>>,
}

#[derive(Default)]
struct SpaceState {
    rows: HashMap<FeatureId, Feature>,
    tombstones: HashSet<FeatureId>,
    history: BTreeMap<(FeatureId, u64), HistoryRecord>,
    // Highest version ever stamped per id; survives physical deletes.
    watermarks: HashMap<FeatureId, u64>,
}

impl SpaceState {
    fn watermark(&self, id: &FeatureId) -> u64 {
        self.watermarks.get(id).copied().unwrap_or(0)
    }

    fn bump_watermark(&mut self, id: &FeatureId, version: u64) {
        let slot = self.watermarks.entry(id.clone()).or_insert(0);
        if version > *slot {
            *slot = version;
        }
    }

    fn row(&self, id: &FeatureId) -> LayerRow {
        if let Some(feature) = self.rows.get(id) {
            LayerRow::Live(feature.clone())
        } else if self.tombstones.contains(id) {
            LayerRow::Tombstone
        } else {
            LayerRow::Absent
        }
    }

    fn check_precondition(&self, id: &FeatureId, expected: &Precondition) -> StoreResult<()> {
        let current = self.row(id);
        let holds = match expected {
            Precondition::Version(v) => {
                matches!(&current, LayerRow::Live(f) if f.meta.version == *v)
            }
            Precondition::NoRow { watermark } => {
                matches!(current, LayerRow::Absent) && self.watermark(id) == *watermark
            }
            Precondition::Tombstone { watermark } => {
                matches!(current, LayerRow::Tombstone) && self.watermark(id) == *watermark
            }
        };
        if holds {
            Ok(())
        } else {
            Err(StoreError::VersionRace {
                id: id.clone(),
                expected: expected.clone(),
                found: current.describe(),
            })
        }
    }

    fn check(&self, op: &RowOp) -> StoreResult<()> {
        match op {
            RowOp::Put { feature, expected } => self.check_precondition(&feature.id, expected),
            RowOp::Delete { id, expected } => {
                self.check_precondition(id, &Precondition::Version(*expected))
            }
            RowOp::SetTombstone { id, expected } => self.check_precondition(id, expected),
            RowOp::Archive { record } => {
                let key = (record.feature.id.clone(), record.version());
                if self.history.contains_key(&key) {
                    Err(StoreError::HistoryCollision {
                        id: record.feature.id.clone(),
                        version: record.version(),
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    fn execute(&mut self, op: &RowOp) {
        match op {
            RowOp::Put { feature, .. } => {
                // Live row and marker are mutually exclusive.
                self.tombstones.remove(&feature.id);
                self.bump_watermark(&feature.id, feature.meta.version);
                self.rows.insert(feature.id.clone(), feature.clone());
            }
            RowOp::Delete { id, .. } => {
                self.rows.remove(id);
            }
            RowOp::SetTombstone { id, .. } => {
                self.rows.remove(id);
                self.tombstones.insert(id.clone());
            }
            RowOp::Archive { record } => {
                self.bump_watermark(&record.feature.id, record.version());
                self.history
                    .insert((record.feature.id.clone(), record.version()), record.clone());
            }
        }
    }
}

impl InMemoryFeatureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            spaces: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live rows in a space's layer.
    pub fn row_count(&self, space: &SpaceId) -> usize {
        let spaces = self.spaces.read().expect("lock poisoned");
        spaces.get(space).map_or(0, |s| s.rows.len())
    }

    /// Number of archived history records in a space's layer.
    pub fn history_count(&self, space: &SpaceId) -> usize {
        let spaces = self.spaces.read().expect("lock poisoned");
        spaces.get(space).map_or(0, |s| s.history.len())
    }

    /// Returns `true` if the layer holds a shadow marker for `id`.
    pub fn has_tombstone(&self, space: &SpaceId, id: &FeatureId) -> bool {
        let spaces = self.spaces.read().expect("lock poisoned");
        spaces.get(space).is_some_and(|s| s.tombstones.contains(id))
    }

    /// The layer's version watermark for `id`.
    pub fn watermark(&self, space: &SpaceId, id: &FeatureId) -> u64 {
        let spaces = self.spaces.read().expect("lock poisoned");
        spaces.get(space).map_or(0, |s| s.watermark(id))
    }

    /// Drop all state.
    pub fn clear(&self) {
        self.spaces.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryFeatureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureStore for InMemoryFeatureStore {
    fn read_row(&self, space: &SpaceId, id: &FeatureId) -> StoreResult<RowState> {
        let spaces = self.spaces.read().expect("lock poisoned");
        Ok(spaces.get(space).map_or_else(RowState::absent, |s| RowState {
            row: s.row(id),
            watermark: s.watermark(id),
        }))
    }

    fn read_history(
        &self,
        space: &SpaceId,
        id: &FeatureId,
        version: u64,
    ) -> StoreResult<Option<HistoryRecord>> {
        let spaces = self.spaces.read().expect("lock poisoned");
        Ok(spaces
            .get(space)
            .and_then(|s| s.history.get(&(id.clone(), version)).cloned()))
    }

    fn apply(&self, space: &SpaceId, ops: &[RowOp]) -> StoreResult<()> {
        let mut spaces = self.spaces.write().expect("lock poisoned");
        let state = spaces.entry(space.clone()).or_default();

        // Validate everything against the pre-batch state, then mutate.
        for op in ops {
            state.check(op)?;
        }
        for op in ops {
            state.execute(op);
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryFeatureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let spaces = self.spaces.read().expect("lock poisoned");
        f.debug_struct("InMemoryFeatureStore")
            .field("space_count", &spaces.len())
            .finish()
    }
}

/// In-memory space directory for tests and embedding.
pub struct InMemorySpaceDirectory {
    spaces: RwLock<HashMap<SpaceId, Space>>,
}

impl InMemorySpaceDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            spaces: RwLock::new(HashMap::new()),
        }
    }

    /// Register or replace a space descriptor.
    pub fn register(&self, space: Space) {
        let mut spaces = self.spaces.write().expect("lock poisoned");
        spaces.insert(space.id.clone(), space);
    }
}

impl Default for InMemorySpaceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl SpaceDirectory for InMemorySpaceDirectory {
    fn space(&self, id: &SpaceId) -> StoreResult<Option<Space>> {
        let spaces = self.spaces.read().expect("lock poisoned");
        Ok(spaces.get(id).cloned())
    }
}

impl std::fmt::Debug for InMemorySpaceDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let spaces = self.spaces.read().expect("lock poisoned");
        f.debug_struct("InMemorySpaceDirectory")
            .field("space_count", &spaces.len())
            .finish()
    }
}
