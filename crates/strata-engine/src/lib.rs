//! The Strata write engine: policy-driven conflict resolution for
//! batched feature writes.
//!
//! Clients submit ordered batches of feature payloads against a named
//! space. For each item the engine resolves the current head (through
//! the delta and base layers of composite spaces), runs a four-axis
//! decision table over it, and stages a conditioned write: insert,
//! update, delete, shadow-marker change, or nothing at all. Staged
//! writes commit in one atomic apply; optimistic version checks decide
//! races, and a three-way structural merge can resolve concurrent edits
//! automatically.
//!
//! # Key Types
//!
//! - [`WriteEngine`] -- the batch coordinator
//! - [`WriteRequest`] / [`WriteItem`] / [`WriteOptions`] -- what to write and how
//! - [`BatchResult`] / [`Violation`] -- what happened, partitioned by outcome
//! - [`WriteOutcome`] -- the per-feature policy verdict
//! - [`HeadState`] / [`ResolvedHead`] -- where a feature's head lives
//! - [`BatchError`] / [`ErrorKind`] -- whole-batch failures and the closed
//!   kind set they serialize under
//!
//! # Design Rules
//!
//! 1. Policy evaluation is pure: every fact it needs (head state, merge
//!    ancestor) is prefetched, so the decision table does no I/O.
//! 2. Expected conflicts are outcomes, not errors: a rejected feature is
//!    a [`Violation`], and `Err` is reserved for storage faults and
//!    engine bugs.
//! 3. Nothing commits until everything is staged; one precondition miss
//!    at commit rolls back the whole batch as a transient fault.
//! 4. Composite writes touch only the delta layer. The base is shadowed,
//!    never mutated.
//! 5. A feature's version sequence survives deletion; history keys never
//!    collide.

pub mod batch;
pub mod error;
pub mod executor;
pub mod options;
pub mod outcome;
pub mod policy;
pub mod resolver;

// Re-export primary types at crate root for ergonomic imports.
pub use batch::{BatchResult, WriteEngine, WriteItem, WriteRequest};
pub use error::{BatchError, ErrorKind, Violation};
pub use executor::{Applied, WritePlan};
pub use options::{
    IfExists, IfNotExists, OnMergeConflict, OnVersionConflict, WriteOptions, WriteOverrides,
};
pub use outcome::{WriteError, WriteOutcome};
pub use resolver::{resolve_head, HeadState, ResolvedHead};
