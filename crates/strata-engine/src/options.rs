use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Strategy axes
// ---------------------------------------------------------------------------

/// What to do when the targeted feature has no visible head.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IfNotExists {
    /// Write the payload as a new feature.
    Create,
    /// Report `FeatureNotExists`.
    #[default]
    Error,
    /// Leave the space untouched.
    Retain,
}

/// What to do when a head exists and the version check passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IfExists {
    /// Replace the head with the payload (patched onto it when `partial`).
    Replace,
    /// Remove the head; in a composite space this shadows the base instead.
    Delete,
    /// Leave the head untouched.
    Retain,
    /// Report `FeatureExists`.
    #[default]
    Error,
}

/// What to do when the supplied base version does not match the head.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnVersionConflict {
    /// Report `VersionConflict`.
    #[default]
    Error,
    /// Leave the head untouched.
    Retain,
    /// Apply the write anyway, ignoring the mismatch.
    Replace,
    /// Three-way merge the payload with the head over their common ancestor.
    Merge,
}

/// What to do when a three-way merge finds colliding changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnMergeConflict {
    /// Report `MergeConflict`.
    #[default]
    Error,
    /// Leave the head untouched.
    Retain,
    /// Let the payload win over the head's changes.
    Replace,
}

// ---------------------------------------------------------------------------
// WriteOptions
// ---------------------------------------------------------------------------

/// Batch-level write configuration. Built once per request, immutable;
/// individual items override fields through [`WriteOverrides`].
///
/// Every strategy axis defaults to its `Error` arm, so an unconfigured
/// write only ever succeeds against a feature in exactly the state the
/// caller assumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    pub on_not_exists: IfNotExists,
    pub on_exists: IfExists,
    pub on_version_conflict: OnVersionConflict,
    pub on_merge_conflict: OnMergeConflict,
    /// Treat payload properties as a sparse patch over the current state.
    pub partial: bool,
    /// Recorded on every state this batch stamps.
    pub author: String,
    /// Archive pre-images before they are overwritten or removed.
    pub history_enabled: bool,
    /// Abort the whole batch on the first logical conflict. Batch-scoped;
    /// items cannot override it.
    pub transactional: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            on_not_exists: IfNotExists::default(),
            on_exists: IfExists::default(),
            on_version_conflict: OnVersionConflict::default(),
            on_merge_conflict: OnMergeConflict::default(),
            partial: false,
            author: "anonymous".to_string(),
            history_enabled: true,
            transactional: true,
        }
    }
}

impl WriteOptions {
    /// The effective options for one item: every field the overrides set,
    /// the batch value for the rest.
    pub fn apply(&self, overrides: &WriteOverrides) -> WriteOptions {
        WriteOptions {
            on_not_exists: overrides.on_not_exists.unwrap_or(self.on_not_exists),
            on_exists: overrides.on_exists.unwrap_or(self.on_exists),
            on_version_conflict: overrides
                .on_version_conflict
                .unwrap_or(self.on_version_conflict),
            on_merge_conflict: overrides
                .on_merge_conflict
                .unwrap_or(self.on_merge_conflict),
            partial: overrides.partial.unwrap_or(self.partial),
            author: overrides
                .author
                .clone()
                .unwrap_or_else(|| self.author.clone()),
            history_enabled: overrides.history_enabled.unwrap_or(self.history_enabled),
            transactional: self.transactional,
        }
    }
}

// ---------------------------------------------------------------------------
// WriteOverrides
// ---------------------------------------------------------------------------

/// Per-item overrides of the batch [`WriteOptions`]. Unset fields fall
/// back to the batch value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOverrides {
    pub on_not_exists: Option<IfNotExists>,
    pub on_exists: Option<IfExists>,
    pub on_version_conflict: Option<OnVersionConflict>,
    pub on_merge_conflict: Option<OnMergeConflict>,
    pub partial: Option<bool>,
    pub author: Option<String>,
    pub history_enabled: Option<bool>,
}

impl WriteOverrides {
    /// Returns `true` if no field is overridden.
    pub fn is_empty(&self) -> bool {
        self == &WriteOverrides::default()
    }
}
