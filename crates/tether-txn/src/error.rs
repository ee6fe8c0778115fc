use tether_store::StoreError;

use crate::manager::TransactionId;

/// Errors from transaction management.
#[derive(Debug, thiserror::Error)]
pub enum TxnError {
    /// `start_transaction` was called while another transaction is open.
    #[error("transaction {0} is already open")]
    AlreadyOpen(TransactionId),

    /// An operation was issued on a transaction that is not the open one,
    /// or after it was committed or rolled back.
    #[error("transaction integrity error on {transaction}: {reason}")]
    Integrity {
        transaction: TransactionId,
        reason: String,
    },

    /// The backing store failed, including change-sets that could not be
    /// replayed or reverted exactly.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<TxnError> for StoreError {
    fn from(err: TxnError) -> Self {
        match err {
            TxnError::Store(inner) => inner,
            other => StoreError::TransactionIntegrity(other.to_string()),
        }
    }
}

/// Result alias for transaction operations.
pub type TxnResult<T> = Result<T, TxnError>;
