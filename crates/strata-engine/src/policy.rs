use strata_store::HistoryRecord;
use strata_types::{Feature, FeatureMeta};
use strata_value::{diff_partial, merge3, patch, MergeOutcome, PatchResult, Value};

use crate::options::{IfExists, IfNotExists, OnMergeConflict, OnVersionConflict, WriteOptions};
use crate::outcome::{WriteError, WriteOutcome};
use crate::resolver::{HeadState, ResolvedHead};

// ---------------------------------------------------------------------------
// WriteContext
// ---------------------------------------------------------------------------

/// Everything the decision table consumes for one feature, prefetched by
/// the coordinator so evaluation itself performs no I/O.
///
/// `ancestor` is the history state at the item's base version; the
/// coordinator fetches it exactly when a merge could need it (base version
/// supplied, differing from the head, `OnVersionConflict::Merge`
/// configured).
pub struct WriteContext<'a> {
    pub payload: &'a Feature,
    pub base_version: Option<u64>,
    pub head: &'a ResolvedHead,
    /// The write targets the delta layer of a composite space.
    pub composite: bool,
    pub options: &'a WriteOptions,
    pub ancestor: Option<&'a HistoryRecord>,
}

/// Resolve one feature write to its outcome.
///
/// Pure: reads only the context. Total over every reachable
/// `(head, options)` combination; the order of checks is fixed --
/// existence first, then the version comparison, then merge. The only
/// `Err` is a `PatchError` from a structurally impossible patch or merge,
/// which is an invariant failure in the inputs, not a policy outcome.
///
/// The only metadata field an outcome carries out of here is `muuid` on
/// merge-produced updates; the executor stamps everything else.
pub fn evaluate(ctx: &WriteContext<'_>) -> PatchResult<WriteOutcome> {
    match &ctx.head.state {
        HeadState::NotFound => Ok(resolve_missing(ctx)),
        HeadState::FoundLocal(current) | HeadState::FoundInBase(current) => {
            match ctx.base_version {
                Some(supplied) if supplied != current.meta.version => {
                    resolve_conflicting(ctx, current)
                }
                _ => resolve_existing(ctx, current),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Missing head
// ---------------------------------------------------------------------------

fn resolve_missing(ctx: &WriteContext<'_>) -> WriteOutcome {
    match ctx.options.on_not_exists {
        IfNotExists::Create => {
            let feature = payload_feature(ctx);
            if ctx.head.tombstoned {
                WriteOutcome::TombstoneClear(feature)
            } else {
                WriteOutcome::Insert(feature)
            }
        }
        IfNotExists::Error => WriteOutcome::Error(WriteError::not_exists(&ctx.payload.id)),
        IfNotExists::Retain => WriteOutcome::Noop,
    }
}

// ---------------------------------------------------------------------------
// Existing head, version check passed (or bypassed)
// ---------------------------------------------------------------------------

fn resolve_existing(ctx: &WriteContext<'_>, current: &Feature) -> PatchResult<WriteOutcome> {
    match ctx.options.on_exists {
        IfExists::Replace => replace_head(ctx, current),
        IfExists::Delete => Ok(delete_head(ctx, current)),
        IfExists::Retain => Ok(WriteOutcome::Noop),
        IfExists::Error => Ok(WriteOutcome::Error(WriteError::exists(&ctx.payload.id))),
    }
}

fn replace_head(ctx: &WriteContext<'_>, current: &Feature) -> PatchResult<WriteOutcome> {
    let properties = if ctx.options.partial {
        let changes = diff_partial(&current.properties, &ctx.payload.properties);
        patch(&current.properties, &changes)?
    } else {
        ctx.payload.properties.clone()
    };
    // A partial write without geometry keeps the current one; a full
    // replace takes the payload verbatim, geometry included.
    let geometry = match (&ctx.payload.geometry, ctx.options.partial) {
        (Some(g), _) => Some(g.clone()),
        (None, true) => current.geometry.clone(),
        (None, false) => None,
    };

    if properties == current.properties && geometry == current.geometry {
        // An ineffective replace must not burn a version.
        return Ok(WriteOutcome::Noop);
    }

    Ok(WriteOutcome::Update(Feature {
        id: current.id.clone(),
        geometry,
        properties,
        meta: FeatureMeta::default(),
    }))
}

fn delete_head(ctx: &WriteContext<'_>, current: &Feature) -> WriteOutcome {
    if ctx.composite {
        // The base row is out of reach; a marker in the delta shadows it.
        // A local delta row is shadowed the same way so the slot keeps
        // suppressing the base afterwards.
        WriteOutcome::TombstoneSet(current.clone())
    } else {
        WriteOutcome::Delete(current.clone())
    }
}

// ---------------------------------------------------------------------------
// Version conflict
// ---------------------------------------------------------------------------

fn resolve_conflicting(ctx: &WriteContext<'_>, current: &Feature) -> PatchResult<WriteOutcome> {
    match ctx.options.on_version_conflict {
        OnVersionConflict::Error => {
            let supplied = ctx.base_version.unwrap_or(0);
            Ok(WriteOutcome::Error(WriteError::version_conflict(
                &ctx.payload.id,
                supplied,
                current.meta.version,
            )))
        }
        OnVersionConflict::Retain => Ok(WriteOutcome::Noop),
        OnVersionConflict::Replace => resolve_existing(ctx, current),
        OnVersionConflict::Merge => merge_heads(ctx, current),
    }
}

fn merge_heads(ctx: &WriteContext<'_>, current: &Feature) -> PatchResult<WriteOutcome> {
    let base_version = ctx.base_version.unwrap_or(0);
    let Some(ancestor) = ctx.ancestor else {
        // Retention purged the base state (or it never existed); there is
        // no common ancestor to merge over.
        return Ok(WriteOutcome::Error(WriteError::ancestor_gone(
            &ctx.payload.id,
            base_version,
        )));
    };
    let ancestor_state = &ancestor.feature;

    let geometry = match &ctx.payload.geometry {
        Some(g) => Some(g.clone()),
        None => current.geometry.clone(),
    };

    match merge3(
        &ancestor_state.properties,
        &ctx.payload.properties,
        &current.properties,
    )? {
        MergeOutcome::Merged(properties) => {
            if properties == current.properties && geometry == current.geometry {
                return Ok(WriteOutcome::Noop);
            }
            Ok(WriteOutcome::Update(merged_feature(
                current,
                geometry,
                properties,
                ancestor_state,
            )))
        }
        MergeOutcome::Conflicts(conflicts) => match ctx.options.on_merge_conflict {
            OnMergeConflict::Error => Ok(WriteOutcome::Error(WriteError::merge_conflict(
                &ctx.payload.id,
                &conflicts,
            ))),
            OnMergeConflict::Retain => Ok(WriteOutcome::Noop),
            OnMergeConflict::Replace => Ok(WriteOutcome::Update(merged_feature(
                current,
                geometry,
                ctx.payload.properties.clone(),
                ancestor_state,
            ))),
        },
    }
}

// ---------------------------------------------------------------------------
// Outcome features
// ---------------------------------------------------------------------------

/// The payload reduced to resolved content; client-supplied metadata is
/// discarded, the executor stamps its own.
fn payload_feature(ctx: &WriteContext<'_>) -> Feature {
    Feature {
        id: ctx.payload.id.clone(),
        geometry: ctx.payload.geometry.clone(),
        properties: ctx.payload.properties.clone(),
        meta: FeatureMeta::default(),
    }
}

fn merged_feature(
    current: &Feature,
    geometry: Option<Value>,
    properties: Value,
    ancestor_state: &Feature,
) -> Feature {
    Feature {
        id: current.id.clone(),
        geometry,
        properties,
        meta: FeatureMeta {
            muuid: Some(ancestor_state.meta.uuid),
            ..FeatureMeta::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_types::SpaceId;
    use uuid::Uuid;

    use crate::error::ErrorKind;

    fn value(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn payload(id: &str, props: serde_json::Value) -> Feature {
        Feature::new(id, value(props))
    }

    fn head_feature(id: &str, version: u64, props: serde_json::Value) -> Feature {
        let mut f = Feature::new(id, value(props));
        f.meta.version = version;
        f.meta.uuid = Uuid::now_v7();
        f
    }

    fn local(current: Feature) -> ResolvedHead {
        let watermark = current.meta.version;
        ResolvedHead {
            state: HeadState::FoundLocal(current),
            tombstoned: false,
            watermark,
        }
    }

    fn inherited(current: Feature) -> ResolvedHead {
        ResolvedHead {
            state: HeadState::FoundInBase(current),
            tombstoned: false,
            watermark: 0,
        }
    }

    fn missing() -> ResolvedHead {
        ResolvedHead {
            state: HeadState::NotFound,
            tombstoned: false,
            watermark: 0,
        }
    }

    fn shadowed(watermark: u64) -> ResolvedHead {
        ResolvedHead {
            state: HeadState::NotFound,
            tombstoned: true,
            watermark,
        }
    }

    fn ancestor_record(id: &str, version: u64, props: serde_json::Value) -> HistoryRecord {
        HistoryRecord::new(SpaceId::from("roads"), head_feature(id, version, props))
    }

    struct Case<'a> {
        payload: &'a Feature,
        head: &'a ResolvedHead,
        options: WriteOptions,
        base_version: Option<u64>,
        composite: bool,
        ancestor: Option<&'a HistoryRecord>,
    }

    impl<'a> Case<'a> {
        fn new(payload: &'a Feature, head: &'a ResolvedHead) -> Self {
            Self {
                payload,
                head,
                options: WriteOptions::default(),
                base_version: None,
                composite: false,
                ancestor: None,
            }
        }

        fn run(&self) -> WriteOutcome {
            evaluate(&WriteContext {
                payload: self.payload,
                base_version: self.base_version,
                head: self.head,
                composite: self.composite,
                options: &self.options,
                ancestor: self.ancestor,
            })
            .unwrap()
        }
    }

    fn error_kind(outcome: &WriteOutcome) -> Option<ErrorKind> {
        match outcome {
            WriteOutcome::Error(err) => Some(err.kind),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Missing head
    // -----------------------------------------------------------------------

    #[test]
    fn missing_create_inserts() {
        let payload = payload("f-1", json!({"name": "dock"}));
        let head = missing();
        let mut case = Case::new(&payload, &head);
        case.options.on_not_exists = IfNotExists::Create;

        match case.run() {
            WriteOutcome::Insert(f) => {
                assert_eq!(f.properties, value(json!({"name": "dock"})));
                assert!(!f.meta.is_stamped());
            }
            other => panic!("expected Insert, got {other:?}"),
        }
    }

    #[test]
    fn missing_create_over_tombstone_clears() {
        let payload = payload("f-1", json!({"name": "dock"}));
        let head = shadowed(4);
        let mut case = Case::new(&payload, &head);
        case.options.on_not_exists = IfNotExists::Create;
        case.composite = true;

        assert!(matches!(case.run(), WriteOutcome::TombstoneClear(_)));
    }

    #[test]
    fn missing_error_rejects() {
        let payload = payload("f-1", json!({}));
        let head = missing();
        let case = Case::new(&payload, &head);
        assert_eq!(error_kind(&case.run()), Some(ErrorKind::FeatureNotExists));
    }

    #[test]
    fn missing_retain_is_noop() {
        let payload = payload("f-1", json!({}));
        let head = missing();
        let mut case = Case::new(&payload, &head);
        case.options.on_not_exists = IfNotExists::Retain;
        assert_eq!(case.run(), WriteOutcome::Noop);
    }

    #[test]
    fn delete_of_missing_with_retain_is_noop() {
        // Re-applying a delete that already happened: no error, no write.
        let payload = payload("f-1", json!({}));
        let head = missing();
        let mut case = Case::new(&payload, &head);
        case.options.on_not_exists = IfNotExists::Retain;
        case.options.on_exists = IfExists::Delete;
        assert_eq!(case.run(), WriteOutcome::Noop);
    }

    // -----------------------------------------------------------------------
    // Existing head, no version conflict
    // -----------------------------------------------------------------------

    #[test]
    fn existing_replace_updates_verbatim() {
        let payload = payload("f-1", json!({"name": "new"}));
        let head = local(head_feature("f-1", 3, json!({"name": "old", "lanes": 2})));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Replace;

        match case.run() {
            WriteOutcome::Update(f) => {
                // Full replace: absent keys are dropped, not retained.
                assert_eq!(f.properties, value(json!({"name": "new"})));
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn existing_replace_partial_patches() {
        let payload = payload("f-1", json!({"name": "new", "lanes": null}));
        let head = local(head_feature(
            "f-1",
            3,
            json!({"name": "old", "lanes": 2, "surface": "asphalt"}),
        ));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Replace;
        case.options.partial = true;

        match case.run() {
            WriteOutcome::Update(f) => {
                assert_eq!(
                    f.properties,
                    value(json!({"name": "new", "surface": "asphalt"}))
                );
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn existing_replace_identical_is_noop() {
        let payload = payload("f-1", json!({"name": "same"}));
        let head = local(head_feature("f-1", 3, json!({"name": "same"})));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Replace;
        assert_eq!(case.run(), WriteOutcome::Noop);
    }

    #[test]
    fn partial_replace_keeps_current_geometry() {
        let payload = payload("f-1", json!({"name": "new"}));
        let geometry = value(json!({"type": "Point", "coordinates": [1.0, 2.0]}));
        let mut current = head_feature("f-1", 3, json!({"name": "old"}));
        current.geometry = Some(geometry.clone());
        let head = local(current);

        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Replace;
        case.options.partial = true;

        match case.run() {
            WriteOutcome::Update(f) => assert_eq!(f.geometry, Some(geometry)),
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn full_replace_drops_absent_geometry() {
        let payload = payload("f-1", json!({"name": "new"}));
        let mut current = head_feature("f-1", 3, json!({"name": "old"}));
        current.geometry = Some(value(json!({"type": "Point", "coordinates": [0.0, 0.0]})));
        let head = local(current);

        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Replace;

        match case.run() {
            WriteOutcome::Update(f) => assert!(f.geometry.is_none()),
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn geometry_only_change_is_an_update() {
        let geometry = value(json!({"type": "Point", "coordinates": [9.0, 9.0]}));
        let mut payload = payload("f-1", json!({"name": "same"}));
        payload.geometry = Some(geometry.clone());
        let head = local(head_feature("f-1", 3, json!({"name": "same"})));

        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Replace;

        match case.run() {
            WriteOutcome::Update(f) => {
                assert_eq!(f.geometry, Some(geometry));
                assert_eq!(f.properties, value(json!({"name": "same"})));
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn existing_delete_plain_space() {
        let payload = payload("f-1", json!({}));
        let head = local(head_feature("f-1", 3, json!({"name": "old"})));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Delete;

        match case.run() {
            WriteOutcome::Delete(pre) => assert_eq!(pre.meta.version, 3),
            other => panic!("expected Delete, got {other:?}"),
        }
    }

    #[test]
    fn existing_delete_composite_local_head_tombstones() {
        let payload = payload("f-1", json!({}));
        let head = local(head_feature("f-1", 3, json!({"name": "old"})));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Delete;
        case.composite = true;

        assert!(matches!(case.run(), WriteOutcome::TombstoneSet(_)));
    }

    #[test]
    fn existing_delete_composite_inherited_head_tombstones() {
        let payload = payload("f-1", json!({}));
        let head = inherited(head_feature("f-1", 5, json!({"name": "old"})));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Delete;
        case.composite = true;

        match case.run() {
            WriteOutcome::TombstoneSet(pre) => assert_eq!(pre.meta.version, 5),
            other => panic!("expected TombstoneSet, got {other:?}"),
        }
    }

    #[test]
    fn existing_retain_is_noop() {
        let payload = payload("f-1", json!({"name": "new"}));
        let head = local(head_feature("f-1", 3, json!({"name": "old"})));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Retain;
        assert_eq!(case.run(), WriteOutcome::Noop);
    }

    #[test]
    fn existing_error_rejects() {
        let payload = payload("f-1", json!({}));
        let head = local(head_feature("f-1", 3, json!({})));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Error;
        assert_eq!(error_kind(&case.run()), Some(ErrorKind::FeatureExists));
    }

    #[test]
    fn matching_base_version_passes_the_check() {
        let payload = payload("f-1", json!({"name": "new"}));
        let head = local(head_feature("f-1", 3, json!({"name": "old"})));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Replace;
        case.base_version = Some(3);

        assert!(matches!(case.run(), WriteOutcome::Update(_)));
    }

    // -----------------------------------------------------------------------
    // Version conflict
    // -----------------------------------------------------------------------

    #[test]
    fn stale_version_errors_by_default() {
        let payload = payload("f-1", json!({"name": "new"}));
        let head = local(head_feature("f-1", 4, json!({"name": "old"})));
        let mut case = Case::new(&payload, &head);
        case.options.on_exists = IfExists::Replace;
        case.base_version = Some(2);

        match case.run() {
            WriteOutcome::Error(err) => {
                assert_eq!(err.kind, ErrorKind::VersionConflict);
                assert!(err.message.contains("version 4"));
                assert!(err.message.contains("not 2"));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn stale_version_retain_is_noop() {
        let payload = payload("f-1", json!({"name": "new"}));
        let head = local(head_feature("f-1", 4, json!({"name": "old"})));
        let mut case = Case::new(&payload, &head);
        case.base_version = Some(2);
        case.options.on_version_conflict = OnVersionConflict::Retain;
        assert_eq!(case.run(), WriteOutcome::Noop);
    }

    #[test]
    fn stale_version_replace_forces_through() {
        let payload = payload("f-1", json!({"name": "new"}));
        let head = local(head_feature("f-1", 4, json!({"name": "old"})));
        let mut case = Case::new(&payload, &head);
        case.base_version = Some(2);
        case.options.on_version_conflict = OnVersionConflict::Replace;
        case.options.on_exists = IfExists::Replace;

        match case.run() {
            WriteOutcome::Update(f) => assert_eq!(f.properties, value(json!({"name": "new"}))),
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn forced_replace_honors_the_exists_axis() {
        // OnVersionConflict::Replace re-enters the exists table, so a
        // Delete strategy still deletes.
        let payload = payload("f-1", json!({}));
        let head = local(head_feature("f-1", 4, json!({"name": "old"})));
        let mut case = Case::new(&payload, &head);
        case.base_version = Some(2);
        case.options.on_version_conflict = OnVersionConflict::Replace;
        case.options.on_exists = IfExists::Delete;

        assert!(matches!(case.run(), WriteOutcome::Delete(_)));
    }

    // -----------------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------------

    fn merge_case<'a>(
        payload: &'a Feature,
        head: &'a ResolvedHead,
        ancestor: &'a HistoryRecord,
    ) -> Case<'a> {
        let mut case = Case::new(payload, head);
        case.base_version = Some(ancestor.version());
        case.options.on_version_conflict = OnVersionConflict::Merge;
        case.ancestor = Some(ancestor);
        case
    }

    #[test]
    fn merge_disjoint_changes_combine() {
        // Ancestor at v1; head changed "a", payload changed "b".
        let ancestor = ancestor_record("f-1", 1, json!({"a": 1, "b": 1}));
        let head = local(head_feature("f-1", 2, json!({"a": 2, "b": 1})));
        let payload = payload("f-1", json!({"a": 1, "b": 9}));
        let case = merge_case(&payload, &head, &ancestor);

        match case.run() {
            WriteOutcome::Update(f) => {
                assert_eq!(f.properties, value(json!({"a": 2, "b": 9})));
                assert_eq!(f.meta.muuid, Some(ancestor.feature.meta.uuid));
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn merge_identical_to_head_is_noop() {
        // The payload re-applies exactly what the head already did.
        let ancestor = ancestor_record("f-1", 1, json!({"a": 1}));
        let head = local(head_feature("f-1", 2, json!({"a": 2})));
        let payload = payload("f-1", json!({"a": 2}));
        let case = merge_case(&payload, &head, &ancestor);

        assert_eq!(case.run(), WriteOutcome::Noop);
    }

    #[test]
    fn merge_conflict_errors_by_default() {
        let ancestor = ancestor_record("f-1", 1, json!({"a": 1}));
        let head = local(head_feature("f-1", 2, json!({"a": 2})));
        let payload = payload("f-1", json!({"a": 3}));
        let case = merge_case(&payload, &head, &ancestor);

        match case.run() {
            WriteOutcome::Error(err) => {
                assert_eq!(err.kind, ErrorKind::MergeConflict);
                assert!(err.message.contains("$.a"));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn merge_conflict_retain_is_noop() {
        let ancestor = ancestor_record("f-1", 1, json!({"a": 1}));
        let head = local(head_feature("f-1", 2, json!({"a": 2})));
        let payload = payload("f-1", json!({"a": 3}));
        let mut case = merge_case(&payload, &head, &ancestor);
        case.options.on_merge_conflict = OnMergeConflict::Retain;

        assert_eq!(case.run(), WriteOutcome::Noop);
    }

    #[test]
    fn merge_conflict_replace_lets_payload_win() {
        let ancestor = ancestor_record("f-1", 1, json!({"a": 1, "b": 1}));
        let head = local(head_feature("f-1", 2, json!({"a": 2, "b": 1})));
        let payload = payload("f-1", json!({"a": 3, "b": 7}));
        let mut case = merge_case(&payload, &head, &ancestor);
        case.options.on_merge_conflict = OnMergeConflict::Replace;

        match case.run() {
            WriteOutcome::Update(f) => {
                assert_eq!(f.properties, value(json!({"a": 3, "b": 7})));
                assert_eq!(f.meta.muuid, Some(ancestor.feature.meta.uuid));
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn merge_without_ancestor_is_a_version_conflict() {
        let head = local(head_feature("f-1", 5, json!({"a": 2})));
        let payload = payload("f-1", json!({"a": 3}));
        let mut case = Case::new(&payload, &head);
        case.base_version = Some(2);
        case.options.on_version_conflict = OnVersionConflict::Merge;

        match case.run() {
            WriteOutcome::Error(err) => {
                assert_eq!(err.kind, ErrorKind::VersionConflict);
                assert!(err.message.contains("no history at version 2"));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn merge_keeps_current_geometry_when_payload_has_none() {
        let ancestor = ancestor_record("f-1", 1, json!({"a": 1, "b": 1}));
        let geometry = value(json!({"type": "Point", "coordinates": [3.0, 4.0]}));
        let mut current = head_feature("f-1", 2, json!({"a": 2, "b": 1}));
        current.geometry = Some(geometry.clone());
        let head = local(current);
        let payload = payload("f-1", json!({"a": 1, "b": 9}));
        let case = merge_case(&payload, &head, &ancestor);

        match case.run() {
            WriteOutcome::Update(f) => assert_eq!(f.geometry, Some(geometry)),
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn merge_applies_against_inherited_head() {
        let ancestor = ancestor_record("f-1", 1, json!({"a": 1, "b": 1}));
        let head = inherited(head_feature("f-1", 2, json!({"a": 2, "b": 1})));
        let payload = payload("f-1", json!({"a": 1, "b": 9}));
        let case = merge_case(&payload, &head, &ancestor);

        match case.run() {
            WriteOutcome::Update(f) => {
                assert_eq!(f.properties, value(json!({"a": 2, "b": 9})));
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }
}
