//! RDF collections: chains of anonymous cells linked by `rdf:first` and
//! `rdf:rest`, terminated by `rdf:nil`.

use std::collections::BTreeSet;

use tether_store::{StoreResult, TripleStore};
use tether_types::vocab::rdf;
use tether_types::{Node, Triple};
use tracing::debug;

/// Write a fresh chain holding `elements` and return its head.
/// An empty list is `rdf:nil` itself.
pub fn write_list(store: &dyn TripleStore, elements: &[Node]) -> StoreResult<Node> {
    let cells = elements
        .iter()
        .map(|_| store.add_blank_node())
        .collect::<StoreResult<Vec<_>>>()?;
    let nil = Node::uri(rdf::NIL);
    for (i, (cell, element)) in cells.iter().zip(elements).enumerate() {
        let rest = cells.get(i + 1).cloned().unwrap_or_else(|| nil.clone());
        store.add(&Triple::new(cell.clone(), Node::uri(rdf::FIRST), element.clone()))?;
        store.add(&Triple::new(cell.clone(), Node::uri(rdf::REST), rest))?;
    }
    debug!(cells = cells.len(), "wrote list");
    Ok(cells.into_iter().next().unwrap_or(nil))
}

/// Read the elements of the chain starting at `head`.
///
/// Returns `None` for a malformed chain: a cell missing `rdf:first` or
/// `rdf:rest`, or a chain that loops back on itself.
pub fn read_list(store: &dyn TripleStore, head: &Node) -> StoreResult<Option<Vec<Node>>> {
    let nil = Node::uri(rdf::NIL);
    let mut elements = Vec::new();
    let mut visited = BTreeSet::new();
    let mut cell = head.clone();
    while cell != nil {
        if !cell.is_resource() || !visited.insert(cell.clone()) {
            return Ok(None);
        }
        let first = store.match_first(&Triple::new(
            cell.clone(),
            Node::uri(rdf::FIRST),
            Node::Nothing,
        ))?;
        let rest = store.match_first(&Triple::new(
            cell.clone(),
            Node::uri(rdf::REST),
            Node::Nothing,
        ))?;
        match (first, rest) {
            (Some(first), Some(rest)) => {
                elements.push(first.object);
                cell = rest.object;
            }
            _ => return Ok(None),
        }
    }
    Ok(Some(elements))
}
