//! The object/node bijection.
//!
//! Storing produces the object-to-node half, loading produces the
//! node-to-object half; [`sync_map`] reconciles one half from the other.
//! The halves never hold owning references: a handle in the map may point
//! at a destroyed object, which callers check against the graph.

use std::collections::BTreeMap;
use std::fmt::Debug;

use tether_object::Handle;
use tether_types::Node;

use crate::error::{MapperError, MapperResult};

/// Object-to-node half, produced by the storer.
pub type NodeMap = BTreeMap<Handle, Node>;

/// Node-to-object half, produced by the loader.
pub type ObjectMap = BTreeMap<Node, Handle>;

/// Make `to` the inverse of `from`.
///
/// Fails if `to` already maps some `b` of `from` to a different `a`: the
/// halves have diverged. `to` is left untouched in that case. Entries of
/// `to` with no counterpart in `from` are pruned.
pub fn sync_map<A, B>(to: &mut BTreeMap<B, A>, from: &BTreeMap<A, B>) -> MapperResult<()>
where
    A: Ord + Clone + Debug,
    B: Ord + Clone + Debug,
{
    for (a, b) in from {
        if let Some(existing) = to.get(b) {
            if existing != a {
                return Err(MapperError::MappingInconsistency(format!(
                    "{b:?} maps to both {existing:?} and {a:?}"
                )));
            }
        }
    }
    for (a, b) in from {
        to.insert(b.clone(), a.clone());
    }
    to.retain(|b, a| from.get(a) == Some(b));
    Ok(())
}

/// Both halves of the object/node map, kept mutually inverse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectNodeMap {
    nodes: NodeMap,
    objects: ObjectMap,
}

impl ObjectNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, object: Handle) -> Option<&Node> {
        self.nodes.get(&object)
    }

    pub fn object(&self, node: &Node) -> Option<Handle> {
        self.objects.get(node).copied()
    }

    /// Pair `object` with `node`.
    ///
    /// Fails if the node already belongs to a different object. A previous
    /// node of `object` is released.
    pub fn insert(&mut self, object: Handle, node: Node) -> MapperResult<()> {
        if let Some(owner) = self.objects.get(&node) {
            if *owner != object {
                return Err(MapperError::MappingInconsistency(format!(
                    "{node} already belongs to {owner}, cannot map it to {object}"
                )));
            }
        }
        if let Some(old) = self.nodes.insert(object, node.clone()) {
            self.objects.remove(&old);
        }
        self.objects.insert(node, object);
        Ok(())
    }

    pub fn remove_object(&mut self, object: Handle) -> Option<Node> {
        let node = self.nodes.remove(&object)?;
        self.objects.remove(&node);
        Some(node)
    }

    pub fn remove_node(&mut self, node: &Node) -> Option<Handle> {
        let object = self.objects.remove(node)?;
        self.nodes.remove(&object);
        Some(object)
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn objects(&self) -> &ObjectMap {
        &self.objects
    }

    /// Replace the object-to-node half and reconcile the other from it.
    ///
    /// Pairs that `nodes` re-points are released first; a node claimed by
    /// two objects of `nodes` still fails.
    pub fn absorb_nodes(&mut self, nodes: NodeMap) -> MapperResult<()> {
        let stale: Vec<Handle> = self
            .nodes
            .iter()
            .filter(|(object, node)| nodes.get(*object) != Some(*node))
            .map(|(object, _)| *object)
            .collect();
        for object in stale {
            self.remove_object(object);
        }
        sync_map(&mut self.objects, &nodes)?;
        self.nodes = nodes;
        Ok(())
    }

    /// Replace the node-to-object half and reconcile the other from it.
    ///
    /// Pairs that `objects` re-points are released first.
    pub fn absorb_objects(&mut self, objects: ObjectMap) -> MapperResult<()> {
        let stale: Vec<Node> = self
            .objects
            .iter()
            .filter(|(node, object)| objects.get(*node) != Some(*object))
            .map(|(node, _)| node.clone())
            .collect();
        for node in stale {
            self.remove_node(&node);
        }
        sync_map(&mut self.nodes, &objects)?;
        self.objects = objects;
        Ok(())
    }

    /// Verify the halves are exact inverses.
    pub fn check(&self) -> MapperResult<()> {
        if self.nodes.len() != self.objects.len() {
            return Err(MapperError::MappingInconsistency(format!(
                "{} objects but {} nodes mapped",
                self.nodes.len(),
                self.objects.len()
            )));
        }
        for (object, node) in &self.nodes {
            if self.objects.get(node) != Some(object) {
                return Err(MapperError::MappingInconsistency(format!(
                    "{object} maps to {node} but not back"
                )));
            }
        }
        Ok(())
    }
}
