//! Foundation types for Tether.
//!
//! This crate provides the RDF-side data model shared by every other Tether
//! crate: the tagged [`Node`] variant, the [`Triple`] statement, and the
//! ordered, revertible [`ChangeSet`].
//!
//! # Key Types
//!
//! - [`Node`] -- Uri, blank node, literal, or the `Nothing` wildcard
//! - [`Triple`] -- subject/predicate/object statement or match pattern
//! - [`ChangeSet`] -- ordered list of add/remove operations, revertible by
//!   replaying it back-to-front with the operation sense flipped
//! - [`vocab`] -- RDF, XSD and Tether vocabulary constants

pub mod change;
pub mod error;
pub mod node;
pub mod triple;
pub mod vocab;

pub use change::{Change, ChangeOp, ChangeSet};
pub use error::TypeError;
pub use node::Node;
pub use triple::{Position, Triple};
