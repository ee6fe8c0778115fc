use tether_types::{ChangeOp, Position, Triple, TypeError};

/// Errors from triple store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A triple is missing a required position.
    #[error("incomplete statement {triple}: invalid {position}")]
    IncompleteStatement { triple: Triple, position: Position },

    /// A change-set entry could not be applied exactly as recorded: the
    /// triple to add was already present, or the triple to remove was absent.
    #[error("change not applicable ({op:?}) for {triple}")]
    ChangeNotApplicable { op: ChangeOp, triple: Triple },

    /// An operation was issued through a transaction handle that is no
    /// longer the open transaction.
    #[error("transaction integrity error: {0}")]
    TransactionIntegrity(String),

    /// The backend does not implement the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// I/O error from dumping or loading a store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::IncompleteStatement { triple, position } => {
                StoreError::IncompleteStatement { triple, position }
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
