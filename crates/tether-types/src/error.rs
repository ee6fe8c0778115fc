use thiserror::Error;

use crate::triple::{Position, Triple};

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("incomplete statement {triple}: invalid {position}")]
    IncompleteStatement { triple: Triple, position: Position },

    #[error("invalid term: {0}")]
    InvalidTerm(String),
}
