//! Transaction manager for Tether.
//!
//! One backing store is shared by two contexts:
//!
//! - **Direct** -- the store shows only committed state.
//! - **Transactional** -- the open transaction's pending change-set has been
//!   replayed into the store.
//!
//! Switching is lazy. The first operation issued through a [`Transaction`]
//! replays its change-set so far; the first operation issued directly on the
//! [`TransactionManager`] while a transaction is open reverts it again. A
//! direct read therefore never observes a partial transaction.
//!
//! All access is serialized by one re-entrant lock per manager, held by a
//! transaction for its whole lifetime: at most one transaction is in flight,
//! and other threads block until it commits or rolls back. There is no
//! timeout.

pub mod error;
pub mod manager;
pub mod transaction;

pub use error::{TxnError, TxnResult};
pub use manager::{CommitNotice, Context, SharedStore, TransactionId, TransactionManager};
pub use transaction::Transaction;
