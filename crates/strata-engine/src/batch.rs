use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use strata_store::{FeatureStore, HistoryRecord, SpaceDirectory};
use strata_types::{Feature, FeatureId, Space, SpaceId};

use crate::error::{BatchError, Violation};
use crate::executor::{self, Applied, WritePlan};
use crate::options::{OnVersionConflict, WriteOptions, WriteOverrides};
use crate::outcome::WriteOutcome;
use crate::policy::{self, WriteContext};
use crate::resolver::{resolve_head, HeadState, ResolvedHead};

// ---------------------------------------------------------------------------
// WriteRequest
// ---------------------------------------------------------------------------

/// One feature write inside a batch.
#[derive(Clone, Debug)]
pub struct WriteItem {
    pub payload: Feature,
    /// The version the caller believed was current; `None` skips the
    /// optimistic check entirely.
    pub base_version: Option<u64>,
    pub overrides: WriteOverrides,
}

impl WriteItem {
    pub fn new(payload: Feature) -> Self {
        Self {
            payload,
            base_version: None,
            overrides: WriteOverrides::default(),
        }
    }

    /// Claim the head was at `version` when this write was prepared.
    pub fn at_version(mut self, version: u64) -> Self {
        self.base_version = Some(version);
        self
    }

    pub fn with_overrides(mut self, overrides: WriteOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// An ordered batch of writes against one space.
#[derive(Clone, Debug)]
pub struct WriteRequest {
    pub space: SpaceId,
    pub items: Vec<WriteItem>,
    pub options: WriteOptions,
    /// Wall-clock budget for the whole batch; expiry aborts like a
    /// storage fault.
    pub timeout: Option<Duration>,
}

impl WriteRequest {
    pub fn new(space: impl Into<SpaceId>, items: Vec<WriteItem>) -> Self {
        Self {
            space: space.into(),
            items,
            options: WriteOptions::default(),
            timeout: None,
        }
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ---------------------------------------------------------------------------
// BatchResult
// ---------------------------------------------------------------------------

/// The aggregate outcome of a committed batch, partitioned by what
/// happened to each item. Items that failed policy appear in
/// `violations` (only possible for non-transactional batches; a
/// transactional batch aborts instead).
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchResult {
    /// Newly created heads, in item order, stamped metadata included.
    pub inserted: Vec<Feature>,
    /// Replaced heads, stamped.
    pub updated: Vec<Feature>,
    /// Removed or shadowed ids.
    pub deleted: Vec<FeatureId>,
    /// Ids whose writes resolved to no change.
    pub retained: Vec<FeatureId>,
    /// Per-item policy and validation failures.
    pub violations: Vec<Violation>,
}

impl BatchResult {
    /// Returns `true` when every item committed or retained cleanly.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn inserted_ids(&self) -> Vec<FeatureId> {
        self.inserted.iter().map(|f| f.id.clone()).collect()
    }

    pub fn updated_ids(&self) -> Vec<FeatureId> {
        self.updated.iter().map(|f| f.id.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// WriteEngine
// ---------------------------------------------------------------------------

/// The batch coordinator: resolves, policies, and commits feature writes.
///
/// Collaborators are injected at construction. The engine holds no state
/// of its own and is safe to share across threads; all concurrency
/// control is optimistic, through the preconditions the executor attaches
/// to every row operation.
pub struct WriteEngine {
    store: Arc<dyn FeatureStore>,
    spaces: Arc<dyn SpaceDirectory>,
}

impl WriteEngine {
    pub fn new(store: Arc<dyn FeatureStore>, spaces: Arc<dyn SpaceDirectory>) -> Self {
        Self { store, spaces }
    }

    /// Run one batch to completion.
    ///
    /// Items are processed in input order: validate, resolve the head,
    /// prefetch the merge ancestor if one could be needed, evaluate
    /// policy, stage the write. Nothing touches storage until every item
    /// is staged; the staged plans then commit as one conditioned apply.
    ///
    /// Logical conflicts become violations (or abort the batch when
    /// `transactional`); storage faults and deadline expiry abort the
    /// batch with nothing committed and are reported separately, so
    /// callers can tell "rejected by policy" from "retry the batch".
    pub fn write_batch(&self, request: WriteRequest) -> Result<BatchResult, BatchError> {
        let deadline = request.timeout.map(|t| Instant::now() + t);

        let space = self
            .spaces
            .space(&request.space)?
            .ok_or_else(|| BatchError::SpaceNotFound(request.space.clone()))?;
        if space.read_only {
            return Err(BatchError::ReadOnlySpace(space.id));
        }

        debug!(
            space = %space.id,
            items = request.items.len(),
            transactional = request.options.transactional,
            "write batch started"
        );

        let mut result = BatchResult::default();
        let mut plans: Vec<WritePlan> = Vec::new();
        let mut seen: HashSet<FeatureId> = HashSet::new();

        for (index, item) in request.items.iter().enumerate() {
            check_deadline(deadline)?;
            let options = request.options.apply(&item.overrides);

            if let Some(violation) = validate_item(index, item, &options, &mut seen) {
                self.reject(&mut result, &request.options, violation)?;
                continue;
            }

            let head = resolve_head(self.store.as_ref(), &space, &item.payload.id)?;
            let ancestor = self.ancestor_for(&space, item, &options, &head)?;

            let outcome = policy::evaluate(&WriteContext {
                payload: &item.payload,
                base_version: item.base_version,
                head: &head,
                composite: space.is_composite(),
                options: &options,
                ancestor: ancestor.as_ref(),
            })
            .map_err(|e| BatchError::Internal(format!("policy produced a broken patch: {e}")))?;

            match outcome {
                WriteOutcome::Error(err) => {
                    let violation =
                        Violation::new(index, Some(item.payload.id.clone()), err.kind, err.message);
                    self.reject(&mut result, &request.options, violation)?;
                }
                WriteOutcome::Noop => result.retained.push(item.payload.id.clone()),
                effectful => {
                    if let Some(plan) =
                        executor::plan(&space.id, effectful, &head, &options, Utc::now())?
                    {
                        plans.push(plan);
                    }
                }
            }
        }

        check_deadline(deadline)?;
        executor::commit(self.store.as_ref(), &space.id, &plans)?;

        for plan in plans {
            match plan.applied {
                Applied::Inserted(f) => result.inserted.push(f),
                Applied::Updated(f) => result.updated.push(f),
                Applied::Deleted(f) => result.deleted.push(f.id),
            }
        }

        debug!(
            space = %space.id,
            inserted = result.inserted.len(),
            updated = result.updated.len(),
            deleted = result.deleted.len(),
            retained = result.retained.len(),
            violations = result.violations.len(),
            "write batch committed"
        );
        Ok(result)
    }

    /// Record a logical failure: abort when transactional, collect
    /// otherwise.
    fn reject(
        &self,
        result: &mut BatchResult,
        batch_options: &WriteOptions,
        violation: Violation,
    ) -> Result<(), BatchError> {
        if batch_options.transactional {
            return Err(BatchError::Aborted {
                index: violation.index,
                violation,
            });
        }
        debug!(
            index = violation.index,
            kind = %violation.kind,
            "item rejected"
        );
        result.violations.push(violation);
        Ok(())
    }

    /// Prefetch the merge ancestor when this item could need one: a base
    /// version was supplied, it differs from the visible head, and the
    /// conflict strategy is `Merge`.
    ///
    /// History is read from the layer that owns the head. A local head in
    /// a composite space falls back to the base history on a miss, for
    /// ancestors older than the head's materialization into the delta.
    fn ancestor_for(
        &self,
        space: &Space,
        item: &WriteItem,
        options: &WriteOptions,
        head: &ResolvedHead,
    ) -> Result<Option<HistoryRecord>, BatchError> {
        if options.on_version_conflict != OnVersionConflict::Merge {
            return Ok(None);
        }
        let Some(base_version) = item.base_version else {
            return Ok(None);
        };
        let Some(current) = head.state.current() else {
            return Ok(None);
        };
        if current.meta.version == base_version {
            return Ok(None);
        }

        let id = &item.payload.id;
        let record = match &head.state {
            HeadState::FoundLocal(_) => {
                let local = self.store.read_history(&space.id, id, base_version)?;
                match (local, &space.base) {
                    (None, Some(base)) => self.store.read_history(base, id, base_version)?,
                    (found, _) => found,
                }
            }
            HeadState::FoundInBase(_) => {
                let base = space
                    .base
                    .as_ref()
                    .ok_or_else(|| {
                        BatchError::Internal("inherited head in a plain space".to_string())
                    })?;
                self.store.read_history(base, id, base_version)?
            }
            HeadState::NotFound => None,
        };
        Ok(record)
    }
}

impl std::fmt::Debug for WriteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteEngine").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Per-item validation
// ---------------------------------------------------------------------------

/// Checks that run before any storage access. A failure is an
/// `InvalidRequest` violation for this item alone.
fn validate_item(
    index: usize,
    item: &WriteItem,
    options: &WriteOptions,
    seen: &mut HashSet<FeatureId>,
) -> Option<Violation> {
    let id = &item.payload.id;
    if id.is_empty() {
        return Some(Violation::invalid(index, None, "feature id must not be empty"));
    }
    if options.on_version_conflict == OnVersionConflict::Merge && !options.history_enabled {
        return Some(Violation::invalid(
            index,
            Some(id.clone()),
            "merge resolution requires history to be enabled",
        ));
    }
    if item.base_version == Some(0) {
        return Some(Violation::invalid(
            index,
            Some(id.clone()),
            "base version 0 is invalid; committed versions start at 1",
        ));
    }
    if !seen.insert(id.clone()) {
        return Some(Violation::invalid(
            index,
            Some(id.clone()),
            format!("feature '{id}' appears more than once in the batch"),
        ));
    }
    None
}

fn check_deadline(deadline: Option<Instant>) -> Result<(), BatchError> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(BatchError::DeadlineExceeded),
        _ => Ok(()),
    }
}
