use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use strata_value::Value;

use crate::id::FeatureId;

/// Version metadata stamped onto every stored feature state.
///
/// Payloads supplied by clients carry unstamped metadata (version 0, nil
/// uuid); the write path replaces it wholesale when a state is committed,
/// so nothing a client sends here survives into storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMeta {
    /// Monotonic per-feature version, starting at 1 for the first state.
    pub version: u64,
    /// When the feature was first created in this layer.
    pub created_at: DateTime<Utc>,
    /// When this state was written.
    pub updated_at: DateTime<Utc>,
    /// Who wrote this state.
    pub author: String,
    /// Unique id of this state.
    pub uuid: Uuid,
    /// The uuid of the directly preceding state, absent on first insert.
    pub puuid: Option<Uuid>,
    /// The uuid of the merge ancestor, set when this state was produced
    /// by a three-way merge against an older version.
    pub muuid: Option<Uuid>,
}

impl FeatureMeta {
    /// Returns `true` once the write path has stamped this metadata.
    pub fn is_stamped(&self) -> bool {
        self.version > 0
    }
}

impl Default for FeatureMeta {
    fn default() -> Self {
        Self {
            version: 0,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
            author: String::new(),
            uuid: Uuid::nil(),
            puuid: None,
            muuid: None,
        }
    }
}

/// A geospatial feature: stable id, opaque geometry, structured properties,
/// and version metadata.
///
/// Geometry is carried as-is; the write path never diffs, merges, or
/// inspects it. Only `properties` flows through the document model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Option<Value>,
    pub properties: Value,
    pub meta: FeatureMeta,
}

impl Feature {
    /// A payload feature with unstamped metadata.
    pub fn new(id: impl Into<FeatureId>, properties: Value) -> Self {
        Self {
            id: id.into(),
            geometry: None,
            properties,
            meta: FeatureMeta::default(),
        }
    }

    /// Attach a geometry to this feature.
    pub fn with_geometry(mut self, geometry: Value) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// The committed version, 0 when unstamped.
    pub fn version(&self) -> u64 {
        self.meta.version
    }
}
