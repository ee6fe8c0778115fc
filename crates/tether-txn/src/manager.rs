use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use serde::{Deserialize, Serialize};
use tether_store::{StoreResult, TripleStore};
use tether_types::{ChangeSet, Node, Triple};
use tracing::debug;

use crate::error::{TxnError, TxnResult};
use crate::transaction::Transaction;

/// Shared handle to a backing store.
pub type SharedStore = Arc<dyn TripleStore + Send + Sync>;

/// Identifier of one transaction within a manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// Which view of the data the backing store currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Context {
    /// Only committed state.
    Direct,
    /// Committed state plus the open transaction's pending change-set.
    Transactional,
}

/// Sent to subscribers after a change reaches committed state.
///
/// `transaction` is `None` for writes issued directly on the manager, which
/// commit immediately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitNotice {
    pub transaction: Option<TransactionId>,
    pub changes: ChangeSet,
}

pub(crate) struct TxnState {
    pub(crate) context: Context,
    pub(crate) open: Option<TransactionId>,
    pub(crate) pending: ChangeSet,
    next_id: u64,
}

/// Serializes transactional and direct access to one backing store.
///
/// The manager itself implements [`TripleStore`]: operations on it are
/// *direct* and see committed state only.
pub struct TransactionManager {
    pub(crate) store: SharedStore,
    pub(crate) lock: ReentrantMutex<()>,
    pub(crate) state: Mutex<TxnState>,
    subscribers: Mutex<Vec<Sender<CommitNotice>>>,
}

impl TransactionManager {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            lock: ReentrantMutex::new(()),
            state: Mutex::new(TxnState {
                context: Context::Direct,
                open: None,
                pending: ChangeSet::new(),
                next_id: 0,
            }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Open a transaction.
    ///
    /// Blocks while another thread holds a transaction. Fails with
    /// [`TxnError::AlreadyOpen`] if the calling thread already has one open.
    /// The store stays in direct context until the transaction's first
    /// operation.
    pub fn start_transaction(&self) -> TxnResult<Transaction<'_>> {
        let guard = self.lock.lock();
        let id = {
            let mut state = self.state.lock();
            if let Some(open) = state.open {
                return Err(TxnError::AlreadyOpen(open));
            }
            state.next_id += 1;
            let id = TransactionId(state.next_id);
            state.open = Some(id);
            state.pending.clear();
            id
        };
        debug!(transaction = %id, "transaction started");
        Ok(Transaction::new(self, id, guard))
    }

    /// Receive a [`CommitNotice`] for every change that reaches committed
    /// state from now on.
    pub fn subscribe(&self) -> Receiver<CommitNotice> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// The context the backing store is currently in.
    pub fn context(&self) -> Context {
        self.state.lock().context
    }

    /// The currently open transaction, if any.
    pub fn open_transaction(&self) -> Option<TransactionId> {
        self.state.lock().open
    }

    pub(crate) fn notify(&self, notice: CommitNotice) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(notice.clone()).is_ok());
    }

    /// Return the store to direct context, reverting the pending change-set
    /// if it is currently replayed.
    fn enter_direct(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        if state.context == Context::Transactional {
            self.store.revert(&state.pending)?;
            state.context = Context::Direct;
            debug!(
                pending = state.pending.len(),
                "left transactional context for direct access"
            );
        }
        Ok(())
    }

    fn direct<T>(&self, op: impl FnOnce(&dyn TripleStore) -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self.lock.lock();
        self.enter_direct()?;
        op(self.store.as_ref())
    }
}

impl TripleStore for TransactionManager {
    fn add(&self, triple: &Triple) -> StoreResult<bool> {
        self.direct(|store| {
            let added = store.add(triple)?;
            if added {
                let mut changes = ChangeSet::new();
                changes.push_add(store.expand_triple(triple));
                self.notify(CommitNotice {
                    transaction: None,
                    changes,
                });
            }
            Ok(added)
        })
    }

    fn remove(&self, pattern: &Triple) -> StoreResult<bool> {
        self.direct(|store| {
            let mut changes = ChangeSet::new();
            for triple in store.match_triples(pattern)? {
                if store.remove(&triple)? {
                    changes.push_remove(triple);
                }
            }
            let removed = !changes.is_empty();
            if removed {
                self.notify(CommitNotice {
                    transaction: None,
                    changes,
                });
            }
            Ok(removed)
        })
    }

    fn contains(&self, pattern: &Triple) -> StoreResult<bool> {
        self.direct(|store| store.contains(pattern))
    }

    fn match_triples(&self, pattern: &Triple) -> StoreResult<Vec<Triple>> {
        self.direct(|store| store.match_triples(pattern))
    }

    fn unique_uri(&self, prefix: &str) -> StoreResult<Node> {
        self.direct(|store| store.unique_uri(prefix))
    }

    fn add_blank_node(&self) -> StoreResult<Node> {
        self.direct(|store| store.add_blank_node())
    }

    fn expand(&self, name: &str) -> String {
        self.store.expand(name)
    }
}

impl fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TransactionManager")
            .field("context", &state.context)
            .field("open", &state.open)
            .field("pending", &state.pending.len())
            .finish()
    }
}
