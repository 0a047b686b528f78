//! Applying a [`DiffSet`] to a base value.
//!
//! Patching is pure: the base is never mutated, the result is a new value.
//! Entries are grouped by their leading path step and applied recursively.
//! Within one array, replacements happen first, then appends in ascending
//! index order, then removals from the highest index down, so that index
//! arithmetic stays anchored to the base array's layout.

use std::collections::BTreeMap;

use crate::diff::{DiffOp, DiffSet};
use crate::error::{PatchError, PatchResult};
use crate::path::{Path, PathStep};
use crate::value::Value;

/// Apply `changes` to `base`, producing the patched value.
///
/// Fails when the change set does not fit the base's shape; a diff computed
/// by [`diff`](crate::diff::diff) against `base` always applies cleanly.
pub fn patch(base: &Value, changes: &DiffSet) -> PatchResult<Value> {
    if changes.is_empty() {
        return Ok(base.clone());
    }

    let items: Vec<(&[PathStep], &DiffOp)> = changes
        .iter()
        .map(|e| (e.path.steps(), &e.op))
        .collect();

    // A root entry must stand alone; anything deeper would race it.
    if let Some((_, op)) = items.iter().find(|(steps, _)| steps.is_empty()) {
        if items.len() > 1 {
            return Err(PatchError::OverlappingPaths { path: Path::root() });
        }
        return match op {
            DiffOp::Set(v) => Ok(v.clone()),
            DiffOp::Remove => Err(PatchError::RemoveRoot),
        };
    }

    patch_value(&Path::root(), base, items)
}

/// Apply a group of entries (all with at least one remaining step) to one
/// value. `path` is the location of `base`, for error reporting.
fn patch_value(
    path: &Path,
    base: &Value,
    items: Vec<(&[PathStep], &DiffOp)>,
) -> PatchResult<Value> {
    match base {
        Value::Object(map) => {
            let mut groups: BTreeMap<&str, Vec<(&[PathStep], &DiffOp)>> = BTreeMap::new();
            for (steps, op) in items {
                match &steps[0] {
                    PathStep::Key(k) => groups.entry(k.as_str()).or_default().push((&steps[1..], op)),
                    PathStep::Index(_) => {
                        return Err(PatchError::ShapeMismatch { path: path.clone() })
                    }
                }
            }

            let mut result = map.clone();
            for (key, group) in groups {
                let child_path = path.child_key(key);
                match take_leaf(&child_path, &group)? {
                    Some(DiffOp::Set(v)) => {
                        result.insert(key, v.clone());
                    }
                    Some(DiffOp::Remove) => {
                        if result.remove(key).is_none() {
                            return Err(PatchError::MissingPath { path: child_path });
                        }
                    }
                    None => {
                        let child = map
                            .get(key)
                            .ok_or_else(|| PatchError::MissingPath {
                                path: child_path.clone(),
                            })?;
                        let patched = patch_value(&child_path, child, group)?;
                        result.insert(key, patched);
                    }
                }
            }
            Ok(Value::Object(result))
        }
        Value::Array(elements) => {
            let mut groups: BTreeMap<usize, Vec<(&[PathStep], &DiffOp)>> = BTreeMap::new();
            for (steps, op) in items {
                match &steps[0] {
                    PathStep::Index(i) => groups.entry(*i).or_default().push((&steps[1..], op)),
                    PathStep::Key(_) => {
                        return Err(PatchError::ShapeMismatch { path: path.clone() })
                    }
                }
            }

            let base_len = elements.len();
            let mut result = elements.clone();
            let mut appends: Vec<(usize, Value)> = Vec::new();
            let mut removals: Vec<usize> = Vec::new();

            for (index, group) in groups {
                let child_path = path.child_index(index);
                match take_leaf(&child_path, &group)? {
                    Some(DiffOp::Set(v)) => {
                        if index < base_len {
                            result[index] = v.clone();
                        } else {
                            appends.push((index, v.clone()));
                        }
                    }
                    Some(DiffOp::Remove) => {
                        if index >= base_len {
                            return Err(PatchError::MissingPath { path: child_path });
                        }
                        removals.push(index);
                    }
                    None => {
                        if index >= base_len {
                            return Err(PatchError::MissingPath { path: child_path });
                        }
                        result[index] = patch_value(&child_path, &elements[index], group)?;
                    }
                }
            }

            // Appends must be contiguous from the base length upward.
            let mut expected = base_len;
            for (index, value) in appends {
                if index != expected {
                    return Err(PatchError::OutOfBounds {
                        path: path.clone(),
                        index,
                        len: result.len(),
                    });
                }
                result.push(value);
                expected += 1;
            }

            removals.sort_unstable();
            for index in removals.into_iter().rev() {
                result.remove(index);
            }

            Ok(Value::Array(result))
        }
        _ => Err(PatchError::ShapeMismatch { path: path.clone() }),
    }
}

/// Extract the group's leaf operation (empty remaining path), if present.
/// A leaf cannot coexist with deeper entries for the same child.
fn take_leaf<'a>(
    child_path: &Path,
    group: &[(&[PathStep], &'a DiffOp)],
) -> PatchResult<Option<&'a DiffOp>> {
    let leaf = group.iter().find(|(steps, _)| steps.is_empty());
    match leaf {
        Some((_, op)) => {
            if group.len() > 1 {
                return Err(PatchError::OverlappingPaths {
                    path: child_path.clone(),
                });
            }
            Ok(Some(op))
        }
        None => Ok(None),
    }
}
