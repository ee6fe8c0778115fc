use std::fmt;

use parking_lot::{MutexGuard, ReentrantMutexGuard};
use tether_store::{StoreError, StoreResult, TripleStore};
use tether_types::{ChangeSet, Node, Triple};
use tracing::{debug, info, warn};

use crate::error::{TxnError, TxnResult};
use crate::manager::{CommitNotice, Context, TransactionId, TransactionManager, TxnState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Open,
    Committed,
    RolledBack,
}

/// Handle to the open transaction.
///
/// Every operation issued through the handle is recorded in the
/// transaction's change-set. Dropping the handle without calling
/// [`rollback`](Transaction::rollback) commits it; a failure during that
/// implicit commit is logged.
pub struct Transaction<'a> {
    manager: &'a TransactionManager,
    id: TransactionId,
    outcome: Outcome,
    _guard: ReentrantMutexGuard<'a, ()>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(
        manager: &'a TransactionManager,
        id: TransactionId,
        guard: ReentrantMutexGuard<'a, ()>,
    ) -> Self {
        Self {
            manager,
            id,
            outcome: Outcome::Open,
            _guard: guard,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// The changes recorded so far.
    pub fn pending(&self) -> ChangeSet {
        self.manager.state.lock().pending.clone()
    }

    /// Commit: the store keeps the transaction's changes and returns to
    /// direct context. Subscribers receive a [`CommitNotice`].
    pub fn commit(&mut self) -> TxnResult<ChangeSet> {
        let changes = {
            let mut state = self.manager.state.lock();
            self.check(&state)?;
            if state.context == Context::Direct && !state.pending.is_empty() {
                self.manager.store.change(&state.pending)?;
            }
            state.context = Context::Direct;
            state.open = None;
            std::mem::take(&mut state.pending)
        };
        self.outcome = Outcome::Committed;
        info!(transaction = %self.id, changes = changes.len(), "transaction committed");
        if !changes.is_empty() {
            self.manager.notify(CommitNotice {
                transaction: Some(self.id),
                changes: changes.clone(),
            });
        }
        Ok(changes)
    }

    /// Undo every recorded change. Further operations on this handle fail
    /// with [`TxnError::Integrity`].
    pub fn rollback(&mut self) -> TxnResult<()> {
        let mut state = self.manager.state.lock();
        self.check(&state)?;
        if state.context == Context::Transactional {
            self.manager.store.revert(&state.pending)?;
        }
        info!(
            transaction = %self.id,
            changes = state.pending.len(),
            "transaction rolled back"
        );
        state.context = Context::Direct;
        state.open = None;
        state.pending.clear();
        self.outcome = Outcome::RolledBack;
        Ok(())
    }

    fn check(&self, state: &TxnState) -> TxnResult<()> {
        let reason = match self.outcome {
            Outcome::Committed => Some("transaction already committed"),
            Outcome::RolledBack => Some("transaction was rolled back"),
            Outcome::Open if state.open != Some(self.id) => {
                Some("transaction is not the open transaction")
            }
            Outcome::Open => None,
        };
        match reason {
            None => Ok(()),
            Some(reason) => Err(TxnError::Integrity {
                transaction: self.id,
                reason: reason.into(),
            }),
        }
    }

    /// Lock the shared state and make sure the pending change-set is
    /// replayed into the store.
    fn enter(&self) -> StoreResult<MutexGuard<'a, TxnState>> {
        let mut state = self.manager.state.lock();
        self.check(&state).map_err(StoreError::from)?;
        if state.context == Context::Direct {
            self.manager.store.change(&state.pending)?;
            state.context = Context::Transactional;
            debug!(
                transaction = %self.id,
                pending = state.pending.len(),
                "entered transactional context"
            );
        }
        Ok(state)
    }
}

impl TripleStore for Transaction<'_> {
    fn add(&self, triple: &Triple) -> StoreResult<bool> {
        let mut state = self.enter()?;
        let store = &self.manager.store;
        let added = store.add(triple)?;
        if added {
            state.pending.push_add(store.expand_triple(triple));
        }
        Ok(added)
    }

    fn remove(&self, pattern: &Triple) -> StoreResult<bool> {
        let mut state = self.enter()?;
        let store = &self.manager.store;
        let mut removed = false;
        for triple in store.match_triples(pattern)? {
            if store.remove(&triple)? {
                state.pending.push_remove(triple);
                removed = true;
            }
        }
        Ok(removed)
    }

    fn contains(&self, pattern: &Triple) -> StoreResult<bool> {
        let _state = self.enter()?;
        self.manager.store.contains(pattern)
    }

    fn match_triples(&self, pattern: &Triple) -> StoreResult<Vec<Triple>> {
        let _state = self.enter()?;
        self.manager.store.match_triples(pattern)
    }

    fn unique_uri(&self, prefix: &str) -> StoreResult<Node> {
        let _state = self.enter()?;
        self.manager.store.unique_uri(prefix)
    }

    fn add_blank_node(&self) -> StoreResult<Node> {
        let _state = self.enter()?;
        self.manager.store.add_blank_node()
    }

    fn expand(&self, name: &str) -> String {
        self.manager.store.expand(name)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.outcome == Outcome::Open {
            if let Err(e) = self.commit() {
                warn!(transaction = %self.id, error = %e, "implicit commit failed");
            }
        }
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("outcome", &self.outcome)
            .finish()
    }
}
