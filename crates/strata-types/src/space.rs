use serde::{Deserialize, Serialize};

use crate::id::SpaceId;

/// Descriptor of a space: a named collection features are written into.
///
/// A composite space layers its own rows (the delta layer) over a base
/// space. Reads consult the delta first and fall through to the base;
/// writes only ever touch the delta layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// The space's own id; for composite spaces this names the delta layer.
    pub id: SpaceId,
    /// The base space shadowed by this one, when composite.
    pub base: Option<SpaceId>,
    /// Read-only spaces reject every write batch.
    pub read_only: bool,
}

impl Space {
    /// A plain, self-contained space.
    pub fn new(id: impl Into<SpaceId>) -> Self {
        Self {
            id: id.into(),
            base: None,
            read_only: false,
        }
    }

    /// A composite space layering its delta over `base`.
    pub fn composite(id: impl Into<SpaceId>, base: impl Into<SpaceId>) -> Self {
        Self {
            id: id.into(),
            base: Some(base.into()),
            read_only: false,
        }
    }

    /// Mark the space read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Returns `true` if this space shadows a base space.
    pub fn is_composite(&self) -> bool {
        self.base.is_some()
    }
}
