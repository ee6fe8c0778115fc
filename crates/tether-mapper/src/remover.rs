//! Graph remover: deletes the statements of destroyed objects.

use std::collections::BTreeSet;

use tether_store::TripleStore;
use tether_types::vocab::rdf;
use tether_types::{Node, Triple};
use tracing::debug;

use crate::error::MapperResult;
use crate::gc::collect_garbage;

/// Removes nodes of destroyed objects from a store.
///
/// A removed node loses every statement it is the subject of and every
/// statement referring to it. List cells holding it are spliced out of their
/// chains, and anonymous nodes left unreferenced are collected.
pub struct GraphRemover<'a> {
    store: &'a dyn TripleStore,
    removed: usize,
}

impl<'a> GraphRemover<'a> {
    pub fn new(store: &'a dyn TripleStore) -> Self {
        Self { store, removed: 0 }
    }

    /// Triples removed so far.
    pub fn removed(&self) -> usize {
        self.removed
    }

    /// Remove one node. Returns the number of triples removed.
    pub fn remove(&mut self, node: &Node) -> MapperResult<usize> {
        let mut count = 0;
        let cells = self
            .store
            .match_triples(&Triple::new(Node::Nothing, Node::uri(rdf::FIRST), node.clone()))?;
        for cell in cells {
            count += self.splice_out(&cell.subject)?;
        }

        let outgoing = self
            .store
            .match_triples(&Triple::new(node.clone(), Node::Nothing, Node::Nothing))?;
        let incoming = self
            .store
            .match_triples(&Triple::new(Node::Nothing, Node::Nothing, node.clone()))?;
        for triple in outgoing.iter().chain(&incoming) {
            if self.store.remove(triple)? {
                count += 1;
            }
        }
        let live = BTreeSet::new();
        for triple in &outgoing {
            if triple.object.is_blank() {
                count += collect_garbage(self.store, &triple.object, &live)?;
            }
        }
        debug!(node = %node, removed = count, "removed node");
        self.removed += count;
        Ok(count)
    }

    /// Drop a list cell, pointing whatever referred to it at its tail.
    fn splice_out(&mut self, cell: &Node) -> MapperResult<usize> {
        let rest = self
            .store
            .match_first(&Triple::new(cell.clone(), Node::uri(rdf::REST), Node::Nothing))?
            .map(|t| t.object)
            .unwrap_or_else(|| Node::uri(rdf::NIL));
        let mut count = 0;
        for link in self
            .store
            .match_triples(&Triple::new(Node::Nothing, Node::Nothing, cell.clone()))?
        {
            self.store.remove(&link)?;
            self.store
                .add(&Triple::new(link.subject, link.predicate, rest.clone()))?;
        }
        for triple in self
            .store
            .match_triples(&Triple::new(cell.clone(), Node::Nothing, Node::Nothing))?
        {
            if self.store.remove(&triple)? {
                count += 1;
            }
        }
        Ok(count)
    }
}
