//! Ordered change-sets.
//!
//! A [`ChangeSet`] records the exact add/remove operations one transaction
//! applied to a store, in order. Reverting it means replaying the entries
//! back-to-front with the operation sense flipped; see
//! [`ChangeSet::reverted`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::triple::Triple;

/// Direction of a single change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeOp {
    Add,
    Remove,
}

impl ChangeOp {
    pub fn inverse(self) -> Self {
        match self {
            ChangeOp::Add => ChangeOp::Remove,
            ChangeOp::Remove => ChangeOp::Add,
        }
    }
}

/// One recorded operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Change {
    pub op: ChangeOp,
    pub triple: Triple,
}

impl Change {
    pub fn add(triple: Triple) -> Self {
        Self {
            op: ChangeOp::Add,
            triple,
        }
    }

    pub fn remove(triple: Triple) -> Self {
        Self {
            op: ChangeOp::Remove,
            triple,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            op: self.op.inverse(),
            triple: self.triple.clone(),
        }
    }
}

/// Ordered sequence of changes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn push_add(&mut self, triple: Triple) {
        self.push(Change::add(triple));
    }

    pub fn push_remove(&mut self, triple: Triple) {
        self.push(Change::remove(triple));
    }

    pub fn extend(&mut self, other: ChangeSet) {
        self.changes.extend(other.changes);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Number of add operations.
    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.op == ChangeOp::Add)
            .count()
    }

    /// Number of remove operations.
    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.op == ChangeOp::Remove)
            .count()
    }

    /// The change-set that undoes this one: entries in reverse order, each
    /// with its operation flipped.
    pub fn reverted(&self) -> ChangeSet {
        ChangeSet {
            changes: self.changes.iter().rev().map(Change::inverse).collect(),
        }
    }

    /// Every distinct node that appears as the subject of a changed triple.
    pub fn subjects(&self) -> BTreeSet<Node> {
        self.changes
            .iter()
            .map(|c| c.triple.subject.clone())
            .collect()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl FromIterator<Change> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}
