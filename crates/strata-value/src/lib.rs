//! Document model for Strata.
//!
//! Provides the JSON-like value type feature properties are made of, plus
//! the structural operations the write path builds on: path-level diffing,
//! patching, sparse partial updates, and three-way merge with conflict
//! detection. Everything here is pure and storage-agnostic.
//!
//! # Key Types
//!
//! - [`Value`] / [`ValueMap`] / [`Number`] -- Ordered JSON-like document values
//! - [`Path`] / [`PathStep`] -- Location of a nested value
//! - [`DiffSet`] / [`DiffEntry`] / [`DiffOp`] -- Flat path-keyed change sets
//! - [`MergeOutcome`] / [`MergeConflict`] -- Three-way merge results
//! - [`PatchError`] -- Change sets that do not fit their base

pub mod diff;
pub mod error;
pub mod merge;
pub mod patch;
pub mod path;
pub mod value;

pub use diff::{diff, diff_partial, DiffEntry, DiffOp, DiffSet};
pub use error::{PatchError, PatchResult};
pub use merge::{merge3, merge_diffs, MergeConflict, MergeOutcome};
pub use patch::patch;
pub use path::{Path, PathStep};
pub use value::{Number, Value, ValueKind, ValueMap};
