//! Paths addressing nested locations inside a [`Value`](crate::Value).

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step from a container into one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathStep {
    /// Descend into an object entry by key.
    Key(String),
    /// Descend into an array element by index.
    Index(usize),
}

/// A path from the document root to a nested location.
///
/// The empty path addresses the root itself. Paths order lexicographically
/// by their steps, which keeps change sets and conflict reports stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from a list of steps.
    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// Returns `true` if this is the root path.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the path has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The steps of this path, root first.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// This path extended by an object key.
    pub fn child_key(&self, key: &str) -> Path {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Key(key.to_string()));
        Path { steps }
    }

    /// This path extended by an array index.
    pub fn child_index(&self, index: usize) -> Path {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Index(index));
        Path { steps }
    }

    /// Returns `true` if this path is a strict ancestor of `other`: every
    /// step of `self` matches and `other` descends at least one step
    /// further. A path is not its own ancestor.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.steps.len() < other.steps.len()
            && other.steps[..self.steps.len()] == self.steps[..]
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.steps {
            match step {
                PathStep::Key(k) => write!(f, ".{}", k)?,
                PathStep::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}
