use chrono::{DateTime, Utc};
use uuid::Uuid;

use strata_store::{FeatureStore, HistoryRecord, Precondition, RowOp, StoreResult};
use strata_types::{Feature, FeatureMeta, SpaceId};

use crate::error::BatchError;
use crate::options::WriteOptions;
use crate::outcome::WriteOutcome;
use crate::resolver::{HeadState, ResolvedHead};

// ---------------------------------------------------------------------------
// WritePlan
// ---------------------------------------------------------------------------

/// How a committed write reports in the batch result.
#[derive(Clone, Debug, PartialEq)]
pub enum Applied {
    Inserted(Feature),
    Updated(Feature),
    Deleted(Feature),
}

/// One feature's staged write: the result-facing record plus the row
/// operations that commit it, every one conditioned on the state the
/// resolver observed.
#[derive(Clone, Debug)]
pub struct WritePlan {
    pub applied: Applied,
    pub ops: Vec<RowOp>,
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

/// Stage one resolved outcome: stamp metadata and emit conditioned row
/// operations against the write layer. Pure -- nothing is applied here.
///
/// Metadata stamping: inserts take `watermark + 1` (1 for a never-seen
/// slot, so the version sequence survives physical deletes); updates take
/// `current.version + 1` and keep the pre-image's `created_at`, chaining
/// `puuid` to the pre-image's `uuid`. `muuid` is carried through from the
/// outcome when a merge set it. Pre-images are archived ahead of the row
/// write when history is enabled; an update over an inherited head
/// archives the base pre-image into the write layer's history so later
/// merges can find their ancestor there.
///
/// `Noop` stages nothing. An `Error` outcome, or an effectful outcome
/// whose head state cannot support it, is an invariant failure.
pub fn plan(
    space: &SpaceId,
    outcome: WriteOutcome,
    head: &ResolvedHead,
    options: &WriteOptions,
    now: DateTime<Utc>,
) -> Result<Option<WritePlan>, BatchError> {
    match outcome {
        WriteOutcome::Noop => Ok(None),
        WriteOutcome::Error(err) => Err(BatchError::Internal(format!(
            "error outcome reached the executor: {err}"
        ))),
        WriteOutcome::Insert(feature) => {
            let stamped = stamp_insert(feature, head.watermark + 1, options, now);
            Ok(Some(WritePlan {
                applied: Applied::Inserted(stamped.clone()),
                ops: vec![RowOp::Put {
                    feature: stamped,
                    expected: Precondition::NoRow {
                        watermark: head.watermark,
                    },
                }],
            }))
        }
        WriteOutcome::TombstoneClear(feature) => {
            let stamped = stamp_insert(feature, head.watermark + 1, options, now);
            Ok(Some(WritePlan {
                applied: Applied::Inserted(stamped.clone()),
                ops: vec![RowOp::Put {
                    feature: stamped,
                    expected: Precondition::Tombstone {
                        watermark: head.watermark,
                    },
                }],
            }))
        }
        WriteOutcome::Update(feature) => {
            let (current, expected) = match &head.state {
                HeadState::FoundLocal(cur) => (cur, Precondition::Version(cur.meta.version)),
                // Materializing an inherited head: the write layer's slot
                // must still be empty.
                HeadState::FoundInBase(cur) => (
                    cur,
                    Precondition::NoRow {
                        watermark: head.watermark,
                    },
                ),
                HeadState::NotFound => {
                    return Err(BatchError::Internal(
                        "update planned with no current head".to_string(),
                    ))
                }
            };
            let stamped = stamp_update(feature, current, options, now);
            let mut ops = Vec::with_capacity(2);
            if options.history_enabled {
                ops.push(RowOp::Archive {
                    record: HistoryRecord::new(space.clone(), current.clone()),
                });
            }
            ops.push(RowOp::Put {
                feature: stamped.clone(),
                expected,
            });
            Ok(Some(WritePlan {
                applied: Applied::Updated(stamped),
                ops,
            }))
        }
        WriteOutcome::Delete(pre) => {
            let mut ops = Vec::with_capacity(2);
            if options.history_enabled {
                ops.push(RowOp::Archive {
                    record: HistoryRecord::new(space.clone(), pre.clone()),
                });
            }
            ops.push(RowOp::Delete {
                id: pre.id.clone(),
                expected: pre.meta.version,
            });
            Ok(Some(WritePlan {
                applied: Applied::Deleted(pre),
                ops,
            }))
        }
        WriteOutcome::TombstoneSet(pre) => {
            let expected = match head.state {
                HeadState::FoundLocal(_) => Precondition::Version(pre.meta.version),
                HeadState::FoundInBase(_) => Precondition::NoRow {
                    watermark: head.watermark,
                },
                HeadState::NotFound => {
                    return Err(BatchError::Internal(
                        "tombstone planned with no current head".to_string(),
                    ))
                }
            };
            let mut ops = Vec::with_capacity(2);
            if options.history_enabled {
                ops.push(RowOp::Archive {
                    record: HistoryRecord::new(space.clone(), pre.clone()),
                });
            }
            ops.push(RowOp::SetTombstone {
                id: pre.id.clone(),
                expected,
            });
            Ok(Some(WritePlan {
                applied: Applied::Deleted(pre),
                ops,
            }))
        }
    }
}

/// Flatten the staged plans into one conditioned batch against the write
/// layer. All-or-nothing: a single lost precondition fails the whole
/// apply and nothing lands.
pub fn commit(store: &dyn FeatureStore, space: &SpaceId, plans: &[WritePlan]) -> StoreResult<()> {
    let ops: Vec<RowOp> = plans.iter().flat_map(|p| p.ops.iter().cloned()).collect();
    if ops.is_empty() {
        return Ok(());
    }
    store.apply(space, &ops)
}

// ---------------------------------------------------------------------------
// Stamping
// ---------------------------------------------------------------------------

fn stamp_insert(
    mut feature: Feature,
    version: u64,
    options: &WriteOptions,
    now: DateTime<Utc>,
) -> Feature {
    feature.meta = FeatureMeta {
        version,
        created_at: now,
        updated_at: now,
        author: options.author.clone(),
        uuid: Uuid::now_v7(),
        puuid: None,
        muuid: feature.meta.muuid,
    };
    feature
}

fn stamp_update(
    mut feature: Feature,
    current: &Feature,
    options: &WriteOptions,
    now: DateTime<Utc>,
) -> Feature {
    feature.meta = FeatureMeta {
        version: current.meta.version + 1,
        created_at: current.meta.created_at,
        updated_at: now,
        author: options.author.clone(),
        uuid: Uuid::now_v7(),
        puuid: Some(current.meta.uuid),
        muuid: feature.meta.muuid,
    };
    feature
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_value::Value;

    fn space() -> SpaceId {
        SpaceId::from("roads")
    }

    fn payload(id: &str, props: serde_json::Value) -> Feature {
        Feature::new(id, Value::from(props))
    }

    fn current(id: &str, version: u64) -> Feature {
        let mut f = payload(id, json!({"v": version}));
        f.meta.version = version;
        f.meta.uuid = Uuid::now_v7();
        f.meta.created_at = Utc::now() - chrono::Duration::hours(1);
        f.meta.author = "first".to_string();
        f
    }

    fn local(feature: Feature) -> ResolvedHead {
        let watermark = feature.meta.version;
        ResolvedHead {
            state: HeadState::FoundLocal(feature),
            tombstoned: false,
            watermark,
        }
    }

    fn missing() -> ResolvedHead {
        ResolvedHead {
            state: HeadState::NotFound,
            tombstoned: false,
            watermark: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Insert
    // -----------------------------------------------------------------------

    #[test]
    fn insert_stamps_first_version() {
        let now = Utc::now();
        let head = missing();
        let plan = plan(
            &space(),
            WriteOutcome::Insert(payload("f-1", json!({"a": 1}))),
            &head,
            &WriteOptions::default(),
            now,
        )
        .unwrap()
        .unwrap();

        let feature = match &plan.applied {
            Applied::Inserted(f) => f,
            other => panic!("expected Inserted, got {other:?}"),
        };
        assert_eq!(feature.meta.version, 1);
        assert_eq!(feature.meta.created_at, now);
        assert_eq!(feature.meta.updated_at, now);
        assert_eq!(feature.meta.author, "anonymous");
        assert_ne!(feature.meta.uuid, Uuid::nil());
        assert!(feature.meta.puuid.is_none());

        assert_eq!(plan.ops.len(), 1);
        assert!(matches!(
            plan.ops[0],
            RowOp::Put {
                expected: Precondition::NoRow { watermark: 0 },
                ..
            }
        ));
    }

    #[test]
    fn insert_after_delete_continues_version_sequence() {
        let head = ResolvedHead {
            state: HeadState::NotFound,
            tombstoned: false,
            watermark: 4,
        };
        let plan = plan(
            &space(),
            WriteOutcome::Insert(payload("f-1", json!({}))),
            &head,
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        match &plan.applied {
            Applied::Inserted(f) => assert_eq!(f.meta.version, 5),
            other => panic!("expected Inserted, got {other:?}"),
        }
        assert!(matches!(
            plan.ops[0],
            RowOp::Put {
                expected: Precondition::NoRow { watermark: 4 },
                ..
            }
        ));
    }

    #[test]
    fn tombstone_clear_conditions_on_the_marker() {
        let head = ResolvedHead {
            state: HeadState::NotFound,
            tombstoned: true,
            watermark: 2,
        };
        let plan = plan(
            &space(),
            WriteOutcome::TombstoneClear(payload("f-1", json!({}))),
            &head,
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        match &plan.applied {
            Applied::Inserted(f) => assert_eq!(f.meta.version, 3),
            other => panic!("expected Inserted, got {other:?}"),
        }
        assert_eq!(plan.ops.len(), 1);
        assert!(matches!(
            plan.ops[0],
            RowOp::Put {
                expected: Precondition::Tombstone { watermark: 2 },
                ..
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    #[test]
    fn update_archives_and_swaps_on_version() {
        let now = Utc::now();
        let pre = current("f-1", 3);
        let head = local(pre.clone());
        let plan = plan(
            &space(),
            WriteOutcome::Update(payload("f-1", json!({"a": 2}))),
            &head,
            &WriteOptions::default(),
            now,
        )
        .unwrap()
        .unwrap();

        let feature = match &plan.applied {
            Applied::Updated(f) => f,
            other => panic!("expected Updated, got {other:?}"),
        };
        assert_eq!(feature.meta.version, 4);
        assert_eq!(feature.meta.created_at, pre.meta.created_at);
        assert_eq!(feature.meta.updated_at, now);
        assert_eq!(feature.meta.puuid, Some(pre.meta.uuid));
        assert_ne!(feature.meta.uuid, pre.meta.uuid);

        assert_eq!(plan.ops.len(), 2);
        match &plan.ops[0] {
            RowOp::Archive { record } => {
                assert_eq!(record.version(), 3);
                assert_eq!(record.space, space());
            }
            other => panic!("expected Archive first, got {other:?}"),
        }
        assert!(matches!(
            plan.ops[1],
            RowOp::Put {
                expected: Precondition::Version(3),
                ..
            }
        ));
    }

    #[test]
    fn update_without_history_skips_the_archive() {
        let head = local(current("f-1", 3));
        let options = WriteOptions {
            history_enabled: false,
            ..WriteOptions::default()
        };
        let plan = plan(
            &space(),
            WriteOutcome::Update(payload("f-1", json!({"a": 2}))),
            &head,
            &options,
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(plan.ops.len(), 1);
        assert!(matches!(plan.ops[0], RowOp::Put { .. }));
    }

    #[test]
    fn update_of_inherited_head_materializes_into_empty_slot() {
        let pre = current("f-1", 5);
        let head = ResolvedHead {
            state: HeadState::FoundInBase(pre.clone()),
            tombstoned: false,
            watermark: 0,
        };
        let plan = plan(
            &space(),
            WriteOutcome::Update(payload("f-1", json!({"a": 2}))),
            &head,
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        match &plan.applied {
            Applied::Updated(f) => assert_eq!(f.meta.version, 6),
            other => panic!("expected Updated, got {other:?}"),
        }
        // Base pre-image archived into the write layer's history, row
        // conditioned on the slot still being untouched.
        match &plan.ops[0] {
            RowOp::Archive { record } => assert_eq!(record.version(), 5),
            other => panic!("expected Archive first, got {other:?}"),
        }
        assert!(matches!(
            plan.ops[1],
            RowOp::Put {
                expected: Precondition::NoRow { watermark: 0 },
                ..
            }
        ));
    }

    #[test]
    fn merge_muuid_survives_stamping() {
        let ancestor_uuid = Uuid::now_v7();
        let mut merged = payload("f-1", json!({"a": 2}));
        merged.meta.muuid = Some(ancestor_uuid);
        let head = local(current("f-1", 3));

        let plan = plan(
            &space(),
            WriteOutcome::Update(merged),
            &head,
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        match &plan.applied {
            Applied::Updated(f) => assert_eq!(f.meta.muuid, Some(ancestor_uuid)),
            other => panic!("expected Updated, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Delete / tombstones
    // -----------------------------------------------------------------------

    #[test]
    fn delete_archives_then_removes() {
        let pre = current("f-1", 3);
        let head = local(pre.clone());
        let plan = plan(
            &space(),
            WriteOutcome::Delete(pre.clone()),
            &head,
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(plan.applied, Applied::Deleted(pre));
        assert_eq!(plan.ops.len(), 2);
        assert!(matches!(plan.ops[0], RowOp::Archive { .. }));
        assert!(matches!(plan.ops[1], RowOp::Delete { expected: 3, .. }));
    }

    #[test]
    fn tombstone_over_local_head_conditions_on_version() {
        let pre = current("f-1", 3);
        let head = local(pre.clone());
        let plan = plan(
            &space(),
            WriteOutcome::TombstoneSet(pre),
            &head,
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        assert!(matches!(
            plan.ops[1],
            RowOp::SetTombstone {
                expected: Precondition::Version(3),
                ..
            }
        ));
    }

    #[test]
    fn tombstone_over_inherited_head_conditions_on_empty_slot() {
        let pre = current("f-1", 5);
        let head = ResolvedHead {
            state: HeadState::FoundInBase(pre.clone()),
            tombstoned: false,
            watermark: 0,
        };
        let plan = plan(
            &space(),
            WriteOutcome::TombstoneSet(pre),
            &head,
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        assert!(matches!(
            plan.ops[1],
            RowOp::SetTombstone {
                expected: Precondition::NoRow { watermark: 0 },
                ..
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Degenerate inputs
    // -----------------------------------------------------------------------

    #[test]
    fn noop_stages_nothing() {
        let staged = plan(
            &space(),
            WriteOutcome::Noop,
            &missing(),
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap();
        assert!(staged.is_none());
    }

    #[test]
    fn error_outcome_is_an_invariant_failure() {
        let err = plan(
            &space(),
            WriteOutcome::Error(crate::outcome::WriteError::exists(&"f-1".into())),
            &missing(),
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::Internal(_)));
    }

    #[test]
    fn update_without_head_is_an_invariant_failure() {
        let err = plan(
            &space(),
            WriteOutcome::Update(payload("f-1", json!({}))),
            &missing(),
            &WriteOptions::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::Internal(_)));
    }

    // -----------------------------------------------------------------------
    // commit
    // -----------------------------------------------------------------------

    #[test]
    fn commit_applies_all_plans_at_once() {
        use strata_store::InMemoryFeatureStore;

        let store = InMemoryFeatureStore::new();
        let now = Utc::now();
        let plans: Vec<WritePlan> = ["f-1", "f-2"]
            .iter()
            .map(|id| {
                plan(
                    &space(),
                    WriteOutcome::Insert(payload(id, json!({}))),
                    &missing(),
                    &WriteOptions::default(),
                    now,
                )
                .unwrap()
                .unwrap()
            })
            .collect();

        commit(&store, &space(), &plans).unwrap();
        assert_eq!(store.row_count(&space()), 2);
        let state = store
            .read_row(&space(), &"f-1".into())
            .unwrap();
        assert!(state.row.is_live());
    }

    #[test]
    fn commit_of_nothing_is_fine() {
        let store = strata_store::InMemoryFeatureStore::new();
        commit(&store, &space(), &[]).unwrap();
        assert_eq!(store.row_count(&space()), 0);
    }
}
