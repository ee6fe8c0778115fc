use std::collections::BTreeMap;

use tether_types::{ChangeOp, ChangeSet, Node, Triple};

use crate::error::{StoreError, StoreResult};

/// One row of a query result: variable name to bound node.
pub type QueryRow = BTreeMap<String, Node>;

/// Backing triple store.
///
/// All implementations must satisfy these invariants:
/// - `add` stores only complete triples and returns `false` for duplicates.
/// - `remove` returns `false` when nothing matched; a pattern with wildcards
///   removes every matching triple.
/// - URI-bearing arguments are prefix-expanded before storage or comparison.
/// - Blank nodes and unique URIs handed out are never reused within the
///   store's lifetime.
///
/// The trait carries no `Send + Sync` bound because transaction handles,
/// which hold a lock guard, implement it too. Shared backends are passed
/// around as `Arc<dyn TripleStore + Send + Sync>`.
pub trait TripleStore {
    /// Insert a complete triple. Returns `false` if it was already present.
    fn add(&self, triple: &Triple) -> StoreResult<bool>;

    /// Remove every triple matching `pattern`. Returns `false` if none matched.
    fn remove(&self, pattern: &Triple) -> StoreResult<bool>;

    /// Whether at least one triple matches `pattern`.
    fn contains(&self, pattern: &Triple) -> StoreResult<bool>;

    /// All triples matching `pattern`, in a stable order.
    fn match_triples(&self, pattern: &Triple) -> StoreResult<Vec<Triple>>;

    /// The first triple matching `pattern`, if any.
    fn match_first(&self, pattern: &Triple) -> StoreResult<Option<Triple>> {
        Ok(self.match_triples(pattern)?.into_iter().next())
    }

    /// Evaluate a query string. Backends without a query engine keep this
    /// default.
    fn query(&self, query: &str) -> StoreResult<Vec<QueryRow>> {
        let _ = query;
        Err(StoreError::Unsupported("query".into()))
    }

    /// A Uri under `prefix` that no stored triple mentions yet.
    fn unique_uri(&self, prefix: &str) -> StoreResult<Node>;

    /// Allocate a fresh anonymous node.
    fn add_blank_node(&self) -> StoreResult<Node>;

    /// Expand a `prefix:local` short name to a full URI. Names with no
    /// registered prefix are returned unchanged.
    fn expand(&self, name: &str) -> String;

    /// Expand a Uri node, or the datatype of a typed literal.
    fn expand_node(&self, node: &Node) -> Node {
        match node {
            Node::Uri(uri) => Node::Uri(self.expand(uri)),
            Node::Literal {
                value,
                datatype: Some(dt),
            } => Node::typed_literal(value.clone(), self.expand(dt)),
            other => other.clone(),
        }
    }

    /// Expand every URI and literal datatype carried by a triple.
    fn expand_triple(&self, triple: &Triple) -> Triple {
        Triple::new(
            self.expand_node(&triple.subject),
            self.expand_node(&triple.predicate),
            self.expand_node(&triple.object),
        )
    }

    /// Number of triples currently visible.
    fn len(&self) -> StoreResult<usize> {
        Ok(self.match_triples(&Triple::any())?.len())
    }

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Apply a change-set in order. Every entry must change the store: an
    /// add of a present triple or a remove of an absent one fails with
    /// [`StoreError::ChangeNotApplicable`]. Entries applied before the
    /// failing one stay applied.
    fn change(&self, changes: &ChangeSet) -> StoreResult<()> {
        for change in changes {
            let applied = match change.op {
                ChangeOp::Add => self.add(&change.triple)?,
                ChangeOp::Remove => {
                    if change.triple.is_pattern() {
                        false
                    } else {
                        self.remove(&change.triple)?
                    }
                }
            };
            if !applied {
                return Err(StoreError::ChangeNotApplicable {
                    op: change.op,
                    triple: change.triple.clone(),
                });
            }
        }
        Ok(())
    }

    /// Undo a previously applied change-set.
    fn revert(&self, changes: &ChangeSet) -> StoreResult<()> {
        self.change(&changes.reverted())
    }
}
