//! Versioned row storage for the Strata write engine.
//!
//! This crate defines the storage contract the write engine plans against:
//! one layer of feature rows per space, a shadow-marker set for composite
//! spaces, and an append-only history of archived feature versions. Spaces
//! that inherit from a base hold only their own layer here; composition is
//! resolved above the store.
//!
//! # Row Operations
//!
//! A committed batch is a sequence of [`RowOp`]s, each guarded by a
//! [`Precondition`] on the state of the slot it touches:
//!
//! - [`RowOp::Put`] -- insert or replace a live row (clears any marker)
//! - [`RowOp::Delete`] -- physically remove a live row
//! - [`RowOp::SetTombstone`] -- replace the slot with a shadow marker
//! - [`RowOp::Archive`] -- append a pre-image to the history log
//!
//! # Backends
//!
//! Backends implement [`FeatureStore`]; space descriptors come from a
//! [`SpaceDirectory`].
//!
//! - [`InMemoryFeatureStore`] -- `HashMap`-based store for tests and embedding
//! - [`InMemorySpaceDirectory`] -- in-memory [`SpaceDirectory`]
//!
//! # Design Rules
//!
//! 1. Reads and preconditions see exactly one layer; base fallthrough is
//!    the caller's concern.
//! 2. A batch `apply` is atomic: any precondition failure applies nothing.
//! 3. Preconditions are validated against the state at the start of the
//!    call, not against earlier ops in the same batch.
//! 4. A slot's version watermark never decreases, even across physical
//!    deletes.
//! 5. Concurrent reads are always safe; reads never mutate.
//! 6. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod records;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryFeatureStore, InMemorySpaceDirectory};
pub use records::{HistoryRecord, LayerRow, Precondition, RowOp, RowState};
pub use traits::{FeatureStore, SpaceDirectory};
