use std::collections::BTreeSet;

use tether_store::{StoreResult, TripleStore};
use tether_types::{Node, Triple};
use tracing::debug;

/// Delete an anonymous node's statements once nothing refers to it.
///
/// Blank nodes reached through the deleted statements (list tails, list
/// elements, nested anonymous objects) are collected the same way. Nodes in
/// `live` are never collected. Returns the number of triples removed.
pub fn collect_garbage(
    store: &dyn TripleStore,
    node: &Node,
    live: &BTreeSet<Node>,
) -> StoreResult<usize> {
    let mut removed = 0;
    let mut pending = vec![node.clone()];
    while let Some(node) = pending.pop() {
        if !node.is_blank() || live.contains(&node) {
            continue;
        }
        if store.contains(&Triple::new(Node::Nothing, Node::Nothing, node.clone()))? {
            continue;
        }
        let outgoing = store.match_triples(&Triple::new(node.clone(), Node::Nothing, Node::Nothing))?;
        for triple in outgoing {
            if store.remove(&triple)? {
                removed += 1;
            }
            if triple.object.is_blank() {
                pending.push(triple.object);
            }
        }
    }
    if removed > 0 {
        debug!(root = %node, removed, "collected unreferenced blank nodes");
    }
    Ok(removed)
}
