use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;
use tether_types::{Node, Triple};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::prefix::PrefixMap;
use crate::traits::TripleStore;

/// In-memory, indexed triple store.
///
/// Intended for tests and embedding. Triples live in a `BTreeSet` (giving a
/// stable match order) with subject and object indexes for the common
/// `(s, *, *)` and `(*, *, o)` probes. State sits behind a `RwLock`.
pub struct InMemoryTripleStore {
    inner: RwLock<StoreState>,
    prefixes: RwLock<PrefixMap>,
}

#[derive(Default)]
struct StoreState {
    triples: BTreeSet<Triple>,
    by_subject: HashMap<Node, BTreeSet<Triple>>,
    by_object: HashMap<Node, BTreeSet<Triple>>,
    next_uri: u64,
}

impl StoreState {
    fn insert(&mut self, triple: Triple) -> bool {
        if !self.triples.insert(triple.clone()) {
            return false;
        }
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .insert(triple.clone());
        self.by_object
            .entry(triple.object.clone())
            .or_default()
            .insert(triple);
        true
    }

    fn delete(&mut self, triple: &Triple) -> bool {
        if !self.triples.remove(triple) {
            return false;
        }
        if let Some(set) = self.by_subject.get_mut(&triple.subject) {
            set.remove(triple);
            if set.is_empty() {
                self.by_subject.remove(&triple.subject);
            }
        }
        if let Some(set) = self.by_object.get_mut(&triple.object) {
            set.remove(triple);
            if set.is_empty() {
                self.by_object.remove(&triple.object);
            }
        }
        true
    }

    fn matching(&self, pattern: &Triple) -> Vec<Triple> {
        if !pattern.is_pattern() {
            return self
                .triples
                .get(pattern)
                .cloned()
                .into_iter()
                .collect();
        }
        let candidates: Box<dyn Iterator<Item = &Triple> + '_> = if !pattern.subject.is_nothing() {
            match self.by_subject.get(&pattern.subject) {
                Some(set) => Box::new(set.iter()),
                None => return Vec::new(),
            }
        } else if !pattern.object.is_nothing() {
            match self.by_object.get(&pattern.object) {
                Some(set) => Box::new(set.iter()),
                None => return Vec::new(),
            }
        } else {
            Box::new(self.triples.iter())
        };
        candidates
            .filter(|t| t.matches(pattern))
            .cloned()
            .collect()
    }

    fn mentions(&self, node: &Node) -> bool {
        self.by_subject.contains_key(node) || self.by_object.contains_key(node)
    }
}

impl InMemoryTripleStore {
    /// Create a new empty store with the default prefix table.
    pub fn new() -> Self {
        Self::with_prefixes(PrefixMap::default())
    }

    pub fn with_prefixes(prefixes: PrefixMap) -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
            prefixes: RwLock::new(prefixes),
        }
    }

    /// Register (or replace) a prefix used by [`TripleStore::expand`].
    pub fn register_prefix(&self, prefix: &str, namespace: &str) {
        self.prefixes.write().insert(prefix, namespace);
    }

    pub fn prefixes(&self) -> PrefixMap {
        self.prefixes.read().clone()
    }

    /// Number of triples currently stored.
    pub fn triple_count(&self) -> usize {
        self.inner.read().triples.len()
    }

    /// Remove all triples from the store.
    pub fn clear(&self) {
        let mut state = self.inner.write();
        state.triples.clear();
        state.by_subject.clear();
        state.by_object.clear();
    }

    /// Snapshot of every stored triple, sorted.
    pub fn all_triples(&self) -> Vec<Triple> {
        self.inner.read().triples.iter().cloned().collect()
    }
}

impl Default for InMemoryTripleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TripleStore for InMemoryTripleStore {
    fn add(&self, triple: &Triple) -> StoreResult<bool> {
        let triple = self.prefixes.read().expand_triple(triple);
        if let Some(position) = triple.incomplete_position() {
            return Err(StoreError::IncompleteStatement { triple, position });
        }
        let added = self.inner.write().insert(triple.clone());
        if added {
            debug!(%triple, "added triple");
        }
        Ok(added)
    }

    fn remove(&self, pattern: &Triple) -> StoreResult<bool> {
        let pattern = self.prefixes.read().expand_triple(pattern);
        let mut state = self.inner.write();
        let targets = state.matching(&pattern);
        for triple in &targets {
            state.delete(triple);
            debug!(%triple, "removed triple");
        }
        Ok(!targets.is_empty())
    }

    fn contains(&self, pattern: &Triple) -> StoreResult<bool> {
        let pattern = self.prefixes.read().expand_triple(pattern);
        let state = self.inner.read();
        if !pattern.is_pattern() {
            return Ok(state.triples.contains(&pattern));
        }
        Ok(!state.matching(&pattern).is_empty())
    }

    fn match_triples(&self, pattern: &Triple) -> StoreResult<Vec<Triple>> {
        let pattern = self.prefixes.read().expand_triple(pattern);
        Ok(self.inner.read().matching(&pattern))
    }

    fn unique_uri(&self, prefix: &str) -> StoreResult<Node> {
        let prefix = self.expand(prefix);
        let mut state = self.inner.write();
        loop {
            state.next_uri += 1;
            let candidate = Node::Uri(format!("{prefix}{}", state.next_uri));
            if !state.mentions(&candidate) {
                return Ok(candidate);
            }
        }
    }

    fn add_blank_node(&self) -> StoreResult<Node> {
        Ok(Node::Blank(format!("b{}", Uuid::now_v7().simple())))
    }

    fn expand(&self, name: &str) -> String {
        self.prefixes.read().expand(name)
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.triple_count())
    }
}

impl std::fmt::Debug for InMemoryTripleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.triple_count();
        f.debug_struct("InMemoryTripleStore")
            .field("triple_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_types::vocab::{rdf, xsd};
    use tether_types::{ChangeSet, Position};

    fn t(s: &str, p: &str, o: Node) -> Triple {
        Triple::new(Node::uri(s), Node::uri(p), o)
    }

    // -----------------------------------------------------------------------
    // Core add / remove / contains
    // -----------------------------------------------------------------------

    #[test]
    fn add_reports_duplicates() {
        let store = InMemoryTripleStore::new();
        let triple = t("urn:a", "urn:p", Node::literal("x"));
        assert!(store.add(&triple).unwrap());
        assert!(!store.add(&triple).unwrap());
        assert_eq!(store.triple_count(), 1);
    }

    #[test]
    fn add_rejects_incomplete_statements() {
        let store = InMemoryTripleStore::new();
        let err = store
            .add(&Triple::new(Node::literal("s"), Node::uri("urn:p"), Node::literal("o")))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::IncompleteStatement {
                position: Position::Subject,
                ..
            }
        ));

        let err = store
            .add(&t("urn:a", "urn:p", Node::Nothing))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::IncompleteStatement {
                position: Position::Object,
                ..
            }
        ));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn remove_reports_absence() {
        let store = InMemoryTripleStore::new();
        let triple = t("urn:a", "urn:p", Node::literal("x"));
        assert!(!store.remove(&triple).unwrap());
        store.add(&triple).unwrap();
        assert!(store.remove(&triple).unwrap());
        assert!(!store.contains(&triple).unwrap());
    }

    #[test]
    fn wildcard_remove_removes_all_matches() {
        let store = InMemoryTripleStore::new();
        store.add(&t("urn:a", "urn:p", Node::literal("1"))).unwrap();
        store.add(&t("urn:a", "urn:q", Node::literal("2"))).unwrap();
        store.add(&t("urn:b", "urn:p", Node::literal("3"))).unwrap();

        let pattern = Triple::new(Node::uri("urn:a"), Node::Nothing, Node::Nothing);
        assert!(store.remove(&pattern).unwrap());
        assert_eq!(store.triple_count(), 1);
        assert!(store
            .contains(&t("urn:b", "urn:p", Node::literal("3")))
            .unwrap());
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    #[test]
    fn match_by_subject_object_and_predicate() {
        let store = InMemoryTripleStore::new();
        store.add(&t("urn:a", "urn:p", Node::uri("urn:b"))).unwrap();
        store.add(&t("urn:c", "urn:p", Node::uri("urn:b"))).unwrap();
        store.add(&t("urn:a", "urn:q", Node::literal("x"))).unwrap();

        let by_subject = store
            .match_triples(&Triple::new(Node::uri("urn:a"), Node::Nothing, Node::Nothing))
            .unwrap();
        assert_eq!(by_subject.len(), 2);

        let by_object = store
            .match_triples(&Triple::new(Node::Nothing, Node::Nothing, Node::uri("urn:b")))
            .unwrap();
        assert_eq!(by_object.len(), 2);

        let by_predicate = store
            .match_triples(&Triple::new(Node::Nothing, Node::uri("urn:q"), Node::Nothing))
            .unwrap();
        assert_eq!(by_predicate.len(), 1);

        let none = store
            .match_triples(&Triple::new(Node::uri("urn:zzz"), Node::Nothing, Node::Nothing))
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(store.match_triples(&Triple::any()).unwrap().len(), 3);
    }

    #[test]
    fn match_first_returns_stable_first() {
        let store = InMemoryTripleStore::new();
        store.add(&t("urn:a", "urn:p", Node::literal("2"))).unwrap();
        store.add(&t("urn:a", "urn:p", Node::literal("1"))).unwrap();
        let first = store
            .match_first(&Triple::new(Node::uri("urn:a"), Node::uri("urn:p"), Node::Nothing))
            .unwrap()
            .unwrap();
        assert_eq!(first.object, Node::literal("1"));
    }

    // -----------------------------------------------------------------------
    // Prefix expansion
    // -----------------------------------------------------------------------

    #[test]
    fn short_names_are_expanded_on_the_way_in() {
        let store = InMemoryTripleStore::new();
        store.register_prefix("ex", "http://example.org/");
        store
            .add(&Triple::new(
                Node::uri("ex:alice"),
                Node::uri("rdf:type"),
                Node::uri("ex:Person"),
            ))
            .unwrap();
        assert!(store
            .contains(&Triple::new(
                Node::uri("http://example.org/alice"),
                Node::uri(rdf::TYPE),
                Node::Nothing,
            ))
            .unwrap());
        assert_eq!(store.expand("xsd:integer"), xsd::INTEGER);
    }

    // -----------------------------------------------------------------------
    // Identity allocation
    // -----------------------------------------------------------------------

    #[test]
    fn unique_uri_skips_mentioned_uris() {
        let store = InMemoryTripleStore::new();
        store
            .add(&t("urn:item:1", "urn:p", Node::literal("taken")))
            .unwrap();
        let uri = store.unique_uri("urn:item:").unwrap();
        assert_eq!(uri, Node::uri("urn:item:2"));
        let next = store.unique_uri("urn:item:").unwrap();
        assert_ne!(uri, next);
    }

    #[test]
    fn blank_nodes_are_fresh() {
        let store = InMemoryTripleStore::new();
        let a = store.add_blank_node().unwrap();
        let b = store.add_blank_node().unwrap();
        assert!(a.is_blank());
        assert_ne!(a, b);
    }

    #[test]
    fn query_is_unsupported() {
        let store = InMemoryTripleStore::new();
        assert!(matches!(
            store.query("SELECT * WHERE { ?s ?p ?o }"),
            Err(StoreError::Unsupported(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Change-sets
    // -----------------------------------------------------------------------

    #[test]
    fn change_then_revert_restores_exact_set() {
        let store = InMemoryTripleStore::new();
        store.add(&t("urn:a", "urn:p", Node::literal("keep"))).unwrap();
        store.add(&t("urn:a", "urn:p", Node::literal("drop"))).unwrap();
        let before = store.all_triples();

        let mut cs = ChangeSet::new();
        cs.push_add(t("urn:b", "urn:p", Node::literal("new")));
        cs.push_remove(t("urn:a", "urn:p", Node::literal("drop")));
        store.change(&cs).unwrap();
        assert_ne!(store.all_triples(), before);

        store.revert(&cs).unwrap();
        assert_eq!(store.all_triples(), before);
    }

    #[test]
    fn change_fails_on_duplicate_add() {
        let store = InMemoryTripleStore::new();
        let triple = t("urn:a", "urn:p", Node::literal("x"));
        store.add(&triple).unwrap();
        let mut cs = ChangeSet::new();
        cs.push_add(triple);
        assert!(matches!(
            store.change(&cs),
            Err(StoreError::ChangeNotApplicable { .. })
        ));
    }

    #[test]
    fn change_fails_on_absent_remove() {
        let store = InMemoryTripleStore::new();
        let mut cs = ChangeSet::new();
        cs.push_remove(t("urn:a", "urn:p", Node::literal("x")));
        assert!(matches!(
            store.change(&cs),
            Err(StoreError::ChangeNotApplicable { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn clear_removes_all() {
        let store = InMemoryTripleStore::new();
        store.add(&t("urn:a", "urn:p", Node::literal("x"))).unwrap();
        store.clear();
        assert!(store.is_empty().unwrap());
        assert!(store
            .match_triples(&Triple::new(Node::uri("urn:a"), Node::Nothing, Node::Nothing))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryTripleStore::new());
        store.add(&t("urn:a", "urn:p", Node::literal("x"))).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    assert_eq!(store.match_triples(&Triple::any()).unwrap().len(), 1);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryTripleStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryTripleStore"));
        assert!(debug.contains("triple_count"));
    }
}
