use strata_store::{FeatureStore, LayerRow, StoreResult};
use strata_types::{Feature, FeatureId, Space};

// ---------------------------------------------------------------------------
// HeadState
// ---------------------------------------------------------------------------

/// Which layer, if any, owns the current head of a feature.
#[derive(Clone, Debug, PartialEq)]
pub enum HeadState {
    /// No visible head: nothing in the write layer and nothing inherited.
    NotFound,
    /// The write layer holds the head.
    FoundLocal(Feature),
    /// The head is inherited from the base layer of a composite space.
    FoundInBase(Feature),
}

impl HeadState {
    /// The current head, when one is visible.
    pub fn current(&self) -> Option<&Feature> {
        match self {
            HeadState::NotFound => None,
            HeadState::FoundLocal(f) | HeadState::FoundInBase(f) => Some(f),
        }
    }

    /// Returns `true` when a head is visible in either layer.
    pub fn is_found(&self) -> bool {
        self.current().is_some()
    }
}

// ---------------------------------------------------------------------------
// ResolvedHead
// ---------------------------------------------------------------------------

/// The head state of one feature plus what the write layer knows about
/// its slot: everything policy and executor need, captured in one pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedHead {
    pub state: HeadState,
    /// The write layer holds a shadow marker for this id.
    pub tombstoned: bool,
    /// The write layer's version watermark for this id.
    pub watermark: u64,
}

/// Resolve the visible head of `id` through `space`.
///
/// Consults the space's own layer; for a composite space an absent slot
/// falls through to the base layer. A shadow marker stops the fallthrough
/// cold: the id reads as not found no matter what the base holds. At most
/// one read per consulted layer, and no mutation; if the batch is retried
/// the resolution is repeated from scratch.
pub fn resolve_head(
    store: &dyn FeatureStore,
    space: &Space,
    id: &FeatureId,
) -> StoreResult<ResolvedHead> {
    let local = store.read_row(&space.id, id)?;
    match local.row {
        LayerRow::Live(feature) => Ok(ResolvedHead {
            state: HeadState::FoundLocal(feature),
            tombstoned: false,
            watermark: local.watermark,
        }),
        LayerRow::Tombstone => Ok(ResolvedHead {
            state: HeadState::NotFound,
            tombstoned: true,
            watermark: local.watermark,
        }),
        LayerRow::Absent => {
            if let Some(base) = &space.base {
                let inherited = store.read_row(base, id)?;
                if let LayerRow::Live(feature) = inherited.row {
                    return Ok(ResolvedHead {
                        state: HeadState::FoundInBase(feature),
                        tombstoned: false,
                        watermark: local.watermark,
                    });
                }
            }
            Ok(ResolvedHead {
                state: HeadState::NotFound,
                tombstoned: false,
                watermark: local.watermark,
            })
        }
    }
}
