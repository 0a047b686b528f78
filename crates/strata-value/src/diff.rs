//! Path-level diffs between two document values.
//!
//! A diff is a flat set of `(path, operation)` entries rather than a nested
//! change tree: flat sets index cheaply by path, union naturally during
//! merges, and serialize without recursion. Container values of the same
//! kind are compared structurally; any scalar change or kind change
//! collapses to a single `Set` at that path.

use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::value::Value;

/// The operation a diff entry applies at its path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DiffOp {
    /// Write this value at the path, creating it if absent.
    Set(Value),
    /// Remove the value at the path.
    Remove,
}

/// A single change: a path plus the operation at that path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub path: Path,
    pub op: DiffOp,
}

/// A set of changes keyed by path.
///
/// No two entries share a path; inserting an existing path replaces the
/// previous operation. Entry order is the order of first insertion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffSet {
    entries: Vec<DiffEntry>,
}

impl DiffSet {
    /// Create an empty diff set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The entries in insertion order.
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// Iterate the entries.
    pub fn iter(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter()
    }

    /// The operation at `path`, if any.
    pub fn get(&self, path: &Path) -> Option<&DiffOp> {
        self.entries
            .iter()
            .find(|e| &e.path == path)
            .map(|e| &e.op)
    }

    /// Insert or replace the operation at `path`, returning the previous
    /// operation when one existed.
    pub fn insert(&mut self, path: Path, op: DiffOp) -> Option<DiffOp> {
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => Some(std::mem::replace(&mut entry.op, op)),
            None => {
                self.entries.push(DiffEntry { path, op });
                None
            }
        }
    }

    /// Number of `Set` entries.
    pub fn sets(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.op, DiffOp::Set(_)))
            .count()
    }

    /// Number of `Remove` entries.
    pub fn removes(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.op, DiffOp::Remove))
            .count()
    }
}

impl IntoIterator for DiffSet {
    type Item = DiffEntry;
    type IntoIter = std::vec::IntoIter<DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Diff computation
// ---------------------------------------------------------------------------

/// Compute the minimal path-level changes turning `ancestor` into `side`.
///
/// Objects recurse per key; arrays recurse index-wise over the shared
/// prefix, with tail growth emitted as `Set` at the new indices and tail
/// shrink as `Remove` at the dropped indices. Equal values produce no
/// entry; a kind change is a single `Set` at that path. The result always
/// satisfies `patch(ancestor, diff(ancestor, side)) == side`.
pub fn diff(ancestor: &Value, side: &Value) -> DiffSet {
    let mut out = DiffSet::new();
    diff_at(&Path::root(), ancestor, side, &mut out);
    out
}

fn diff_at(path: &Path, a: &Value, b: &Value, out: &mut DiffSet) {
    if a == b {
        return;
    }
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            for (key, a_val) in ma.iter() {
                match mb.get(key) {
                    Some(b_val) => diff_at(&path.child_key(key), a_val, b_val, out),
                    None => {
                        out.insert(path.child_key(key), DiffOp::Remove);
                    }
                }
            }
            for (key, b_val) in mb.iter() {
                if !ma.contains_key(key) {
                    out.insert(path.child_key(key), DiffOp::Set(b_val.clone()));
                }
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            let shared = xs.len().min(ys.len());
            for i in 0..shared {
                diff_at(&path.child_index(i), &xs[i], &ys[i], out);
            }
            for (i, y) in ys.iter().enumerate().skip(shared) {
                out.insert(path.child_index(i), DiffOp::Set(y.clone()));
            }
            for i in shared..xs.len() {
                out.insert(path.child_index(i), DiffOp::Remove);
            }
        }
        _ => {
            out.insert(path.clone(), DiffOp::Set(b.clone()));
        }
    }
}

/// Compute the changes a partial update applies to `base`.
///
/// Partial payloads follow sparse-overlay semantics: keys present in
/// `partial` overwrite, an explicit `Null` removes the key, object/object
/// pairs recurse, and keys absent from `partial` are left untouched.
/// Arrays and scalars are replaced wholesale. A non-object on either side
/// degenerates to a full replacement at that path.
pub fn diff_partial(base: &Value, partial: &Value) -> DiffSet {
    let mut out = DiffSet::new();
    partial_at(&Path::root(), base, partial, &mut out);
    out
}

fn partial_at(path: &Path, base: &Value, partial: &Value, out: &mut DiffSet) {
    match (base, partial) {
        (Value::Object(base_map), Value::Object(partial_map)) => {
            for (key, p_val) in partial_map.iter() {
                let child = path.child_key(key);
                if p_val.is_null() {
                    if base_map.contains_key(key) {
                        out.insert(child, DiffOp::Remove);
                    }
                    continue;
                }
                match base_map.get(key) {
                    Some(b_val)
                        if matches!(b_val, Value::Object(_))
                            && matches!(p_val, Value::Object(_)) =>
                    {
                        partial_at(&child, b_val, p_val, out);
                    }
                    Some(b_val) if b_val == p_val => {}
                    _ => {
                        out.insert(child, DiffOp::Set(p_val.clone()));
                    }
                }
            }
        }
        _ => {
            if base != partial {
                out.insert(path.clone(), DiffOp::Set(partial.clone()));
            }
        }
    }
}
