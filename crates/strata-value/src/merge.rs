//! Three-way structural merge over document values.
//!
//! Both sides are reduced to path-level diffs against the shared ancestor.
//! Changes at disjoint paths combine; the same change made by both sides
//! collapses to one entry. A conflict is either the same path changed to
//! different results, or one side editing inside a region the other side
//! rewrote or removed (an ancestor/descendant path pair).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::{diff, DiffEntry, DiffOp, DiffSet};
use crate::error::PatchResult;
use crate::patch::patch;
use crate::path::Path;
use crate::value::Value;

/// A pair of changes that cannot be combined.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeConflict {
    /// The shallower of the two paths involved; for same-path conflicts,
    /// that shared path.
    pub path: Path,
    /// The incoming side's change.
    pub ours: DiffEntry,
    /// The current side's change.
    pub theirs: DiffEntry,
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conflicting changes at {} ({} vs {})",
            self.path,
            op_name(&self.ours.op),
            op_name(&self.theirs.op)
        )
    }
}

fn op_name(op: &DiffOp) -> &'static str {
    match op {
        DiffOp::Set(_) => "set",
        DiffOp::Remove => "remove",
    }
}

/// The result of a three-way merge.
#[derive(Clone, Debug, PartialEq)]
pub enum MergeOutcome {
    /// All changes combined cleanly into this value.
    Merged(Value),
    /// At least one pair of changes collided; nothing was merged.
    Conflicts(Vec<MergeConflict>),
}

impl MergeOutcome {
    /// Returns `true` if the merge produced a value.
    pub fn is_clean(&self) -> bool {
        matches!(self, MergeOutcome::Merged(_))
    }

    /// The merged value, if the merge was clean.
    pub fn merged(self) -> Option<Value> {
        match self {
            MergeOutcome::Merged(v) => Some(v),
            MergeOutcome::Conflicts(_) => None,
        }
    }
}

/// Merge two descendants of a common ancestor.
///
/// Computes `diff(ancestor, ours)` and `diff(ancestor, theirs)`, then
/// combines them with [`merge_diffs`]. Pure: no side is mutated.
pub fn merge3(ancestor: &Value, ours: &Value, theirs: &Value) -> PatchResult<MergeOutcome> {
    let ours_diff = diff(ancestor, ours);
    let theirs_diff = diff(ancestor, theirs);
    merge_diffs(ancestor, &ours_diff, &theirs_diff)
}

/// Merge two diffs computed against the same `ancestor`.
///
/// Returns `Err` only when a conflict-free union fails to apply, which
/// means one of the diffs was not computed against `ancestor`.
pub fn merge_diffs(
    ancestor: &Value,
    ours: &DiffSet,
    theirs: &DiffSet,
) -> PatchResult<MergeOutcome> {
    let mut conflicts: Vec<MergeConflict> = Vec::new();

    for our_entry in ours.iter() {
        if let Some(their_op) = theirs.get(&our_entry.path) {
            if *their_op != our_entry.op {
                conflicts.push(MergeConflict {
                    path: our_entry.path.clone(),
                    ours: our_entry.clone(),
                    theirs: DiffEntry {
                        path: our_entry.path.clone(),
                        op: their_op.clone(),
                    },
                });
            }
        }
    }

    for our_entry in ours.iter() {
        for their_entry in theirs.iter() {
            let overlapping = our_entry.path.is_ancestor_of(&their_entry.path)
                || their_entry.path.is_ancestor_of(&our_entry.path);
            if overlapping {
                let path = if our_entry.path.len() <= their_entry.path.len() {
                    our_entry.path.clone()
                } else {
                    their_entry.path.clone()
                };
                conflicts.push(MergeConflict {
                    path,
                    ours: our_entry.clone(),
                    theirs: their_entry.clone(),
                });
            }
        }
    }

    if !conflicts.is_empty() {
        conflicts.sort_by(|a, b| {
            (&a.path, &a.ours.path, &a.theirs.path).cmp(&(&b.path, &b.ours.path, &b.theirs.path))
        });
        conflicts.dedup();
        return Ok(MergeOutcome::Conflicts(conflicts));
    }

    let mut union = ours.clone();
    for their_entry in theirs.iter() {
        union.insert(their_entry.path.clone(), their_entry.op.clone());
    }
    patch(ancestor, &union).map(MergeOutcome::Merged)
}
