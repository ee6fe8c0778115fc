use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::node::Node;

/// Position of a node inside a [`Triple`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Subject,
    Predicate,
    Object,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Subject => f.write_str("subject"),
            Position::Predicate => f.write_str("predicate"),
            Position::Object => f.write_str("object"),
        }
    }
}

/// A subject/predicate/object statement.
///
/// The same type doubles as a match pattern: any position holding
/// [`Node::Nothing`] matches every node. A triple is *complete* only when the
/// subject is a Uri or blank node, the predicate is a Uri, and the object is
/// a Uri, blank node or literal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
}

impl Triple {
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// The all-wildcard pattern.
    pub fn any() -> Self {
        Self::default()
    }

    /// Returns the first position that makes this triple incomplete.
    pub fn incomplete_position(&self) -> Option<Position> {
        if !self.subject.is_resource() {
            return Some(Position::Subject);
        }
        if !self.predicate.is_uri() {
            return Some(Position::Predicate);
        }
        if self.object.is_nothing() {
            return Some(Position::Object);
        }
        None
    }

    pub fn is_complete(&self) -> bool {
        self.incomplete_position().is_none()
    }

    /// Returns `true` if any position is a wildcard.
    pub fn is_pattern(&self) -> bool {
        self.subject.is_nothing() || self.predicate.is_nothing() || self.object.is_nothing()
    }

    /// Validate completeness.
    pub fn ensure_complete(&self) -> Result<(), TypeError> {
        match self.incomplete_position() {
            None => Ok(()),
            Some(position) => Err(TypeError::IncompleteStatement {
                triple: self.clone(),
                position,
            }),
        }
    }

    /// Whether this (concrete) triple is matched by `pattern`.
    pub fn matches(&self, pattern: &Triple) -> bool {
        pattern.subject.accepts(&self.subject)
            && pattern.predicate.accepts(&self.predicate)
            && pattern.object.accepts(&self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
