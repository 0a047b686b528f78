//! Foundation types for Strata.
//!
//! The identifiers and records shared by every layer of the write path:
//! spaces, features, and the version metadata the engine stamps onto each
//! committed state.
//!
//! # Key Types
//!
//! - [`SpaceId`] / [`FeatureId`] -- Identifiers
//! - [`Space`] -- Space descriptor (plain or composite)
//! - [`Feature`] / [`FeatureMeta`] -- The feature record and its version metadata

pub mod feature;
pub mod id;
pub mod space;

pub use feature::{Feature, FeatureMeta};
pub use id::{FeatureId, SpaceId};
pub use space::Space;
