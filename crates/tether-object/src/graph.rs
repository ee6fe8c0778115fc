//! Arena-backed object graph.
//!
//! Objects live in slots addressed by [`Handle`]s. Each slot carries a
//! generation counter, bumped when the slot is freed, so a stale handle is
//! detected instead of silently aliasing a newer object.
//!
//! # Invariants
//!
//! - Every object has at most one parent, and appears exactly once in that
//!   parent's ordered child list.
//! - The parent relation is acyclic.
//! - Destroying an object destroys its whole subtree (children are owned).
//! - Modification and destruction of *observed* objects are journaled as
//!   [`GraphEvent`]s until drained.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ObjectError, ObjectResult};
use crate::variant::Variant;

/// Generation-checked index of an object in an [`ObjectGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A change to an observed object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphEvent {
    Modified(Handle),
    Destroyed(Handle),
}

/// One object: its type, property bag and tree position.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    type_name: String,
    properties: BTreeMap<String, Variant>,
    parent: Option<Handle>,
    children: Vec<Handle>,
    observed: bool,
}

impl Object {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn property(&self, name: &str) -> Option<&Variant> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &BTreeMap<String, Variant> {
        &self.properties
    }

    pub fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub fn children(&self) -> &[Handle] {
        &self.children
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }
}

struct Slot {
    generation: u32,
    object: Option<Object>,
}

/// Arena of objects with owning parent/child edges.
#[derive(Default)]
pub struct ObjectGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    events: Vec<GraphEvent>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.object.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `handle` refers to a live object.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&Object> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    fn get_mut(&mut self, handle: Handle) -> ObjectResult<&mut Object> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.object.as_mut())
            .ok_or(ObjectError::DeadHandle(handle))
    }

    fn require(&self, handle: Handle) -> ObjectResult<&Object> {
        self.get(handle).ok_or(ObjectError::DeadHandle(handle))
    }

    /// All live handles in slot order.
    pub fn handles(&self) -> Vec<Handle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.object.is_some())
            .map(|(index, slot)| Handle {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    /// Live objects without a parent.
    pub fn roots(&self) -> Vec<Handle> {
        self.handles()
            .into_iter()
            .filter(|h| self.get(*h).is_some_and(|o| o.parent.is_none()))
            .collect()
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// Allocate a new object of `type_name`, appended as the last child of
    /// `parent` when one is given.
    ///
    /// The type name is not validated here; construction through a
    /// [`TypeRegistry`](crate::TypeRegistry) is the checked path.
    pub fn create(&mut self, type_name: &str, parent: Option<Handle>) -> ObjectResult<Handle> {
        if let Some(p) = parent {
            self.require(p)?;
        }
        let object = Object {
            type_name: type_name.to_string(),
            properties: BTreeMap::new(),
            parent,
            children: Vec::new(),
            observed: false,
        };
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.object = Some(object);
                Handle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    object: Some(object),
                });
                Handle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        if let Some(p) = parent {
            self.get_mut(p)?.children.push(handle);
        }
        Ok(handle)
    }

    /// Destroy an object and its whole subtree. Returns every destroyed
    /// handle, children before their parent.
    pub fn destroy(&mut self, handle: Handle) -> ObjectResult<Vec<Handle>> {
        let parent = self.require(handle)?.parent;
        if let Some(p) = parent {
            if let Ok(parent_obj) = self.get_mut(p) {
                parent_obj.children.retain(|c| *c != handle);
            }
        }
        let mut destroyed = Vec::new();
        self.destroy_subtree(handle, &mut destroyed);
        debug!(object = %handle, count = destroyed.len(), "destroyed object subtree");
        Ok(destroyed)
    }

    fn destroy_subtree(&mut self, handle: Handle, destroyed: &mut Vec<Handle>) {
        let children = match self.get(handle) {
            Some(obj) => obj.children.clone(),
            None => return,
        };
        for child in children {
            self.destroy_subtree(child, destroyed);
        }
        let slot = &mut self.slots[handle.index as usize];
        if let Some(obj) = slot.object.take() {
            if obj.observed {
                self.events.push(GraphEvent::Destroyed(handle));
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(handle.index);
            destroyed.push(handle);
        }
    }

    // ---------------------------------------------------------------
    // Properties
    // ---------------------------------------------------------------

    pub fn property(&self, handle: Handle, name: &str) -> Option<&Variant> {
        self.get(handle).and_then(|o| o.properties.get(name))
    }

    /// Assign a property, journaling a modification if the object is observed.
    pub fn set_property(&mut self, handle: Handle, name: &str, value: Variant) -> ObjectResult<()> {
        let obj = self.get_mut(handle)?;
        obj.properties.insert(name.to_string(), value);
        if obj.observed {
            self.events.push(GraphEvent::Modified(handle));
        }
        Ok(())
    }

    /// Assign a property without journaling a modification.
    pub fn set_property_quiet(
        &mut self,
        handle: Handle,
        name: &str,
        value: Variant,
    ) -> ObjectResult<()> {
        self.get_mut(handle)?
            .properties
            .insert(name.to_string(), value);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Tree structure
    // ---------------------------------------------------------------

    pub fn parent(&self, handle: Handle) -> Option<Handle> {
        self.get(handle).and_then(|o| o.parent)
    }

    pub fn children(&self, handle: Handle) -> &[Handle] {
        self.get(handle).map(|o| o.children.as_slice()).unwrap_or(&[])
    }

    /// Children of the object's parent, including the object itself.
    pub fn siblings(&self, handle: Handle) -> &[Handle] {
        match self.parent(handle) {
            Some(p) => self.children(p),
            None => &[],
        }
    }

    pub fn previous_sibling(&self, handle: Handle) -> Option<Handle> {
        let siblings = self.siblings(handle);
        let pos = siblings.iter().position(|c| *c == handle)?;
        pos.checked_sub(1).map(|i| siblings[i])
    }

    pub fn next_sibling(&self, handle: Handle) -> Option<Handle> {
        let siblings = self.siblings(handle);
        let pos = siblings.iter().position(|c| *c == handle)?;
        siblings.get(pos + 1).copied()
    }

    /// Whether `ancestor` is `handle` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: Handle, handle: Handle) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            current = self.parent(h);
        }
        false
    }

    /// Move an object under a new parent (appended last), or detach it.
    pub fn set_parent(&mut self, handle: Handle, parent: Option<Handle>) -> ObjectResult<()> {
        let old_parent = self.require(handle)?.parent;
        if old_parent == parent {
            return Ok(());
        }
        if let Some(p) = parent {
            self.require(p)?;
            if self.is_ancestor(handle, p) {
                return Err(ObjectError::CyclicParent { child: handle, parent: p });
            }
        }
        if let Some(old) = old_parent {
            if let Ok(old_obj) = self.get_mut(old) {
                old_obj.children.retain(|c| *c != handle);
            }
        }
        if let Some(p) = parent {
            self.get_mut(p)?.children.push(handle);
        }
        let obj = self.get_mut(handle)?;
        obj.parent = parent;
        if obj.observed {
            self.events.push(GraphEvent::Modified(handle));
        }
        Ok(())
    }

    /// Reorder `parent`'s children. Handles in `order` that are children of
    /// `parent` come first, in that order; the remaining children keep their
    /// relative order after them.
    pub fn reorder_children(&mut self, parent: Handle, order: &[Handle]) -> ObjectResult<()> {
        let obj = self.get_mut(parent)?;
        let mut reordered: Vec<Handle> = order
            .iter()
            .filter(|h| obj.children.contains(h))
            .copied()
            .collect();
        reordered.dedup();
        for child in &obj.children {
            if !reordered.contains(child) {
                reordered.push(*child);
            }
        }
        obj.children = reordered;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Observation
    // ---------------------------------------------------------------

    /// Start journaling modification/destruction events for an object.
    pub fn observe(&mut self, handle: Handle) -> ObjectResult<()> {
        self.get_mut(handle)?.observed = true;
        Ok(())
    }

    pub fn unobserve(&mut self, handle: Handle) -> ObjectResult<()> {
        self.get_mut(handle)?.observed = false;
        Ok(())
    }

    pub fn is_observed(&self, handle: Handle) -> bool {
        self.get(handle).is_some_and(|o| o.observed)
    }

    /// Take all journaled events, oldest first.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }
}

impl fmt::Debug for ObjectGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectGraph")
            .field("objects", &self.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Allocation and handles
    // -----------------------------------------------------------------------

    #[test]
    fn create_and_get() {
        let mut graph = ObjectGraph::new();
        let h = graph.create("Person", None).unwrap();
        assert_eq!(graph.get(h).unwrap().type_name(), "Person");
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.roots(), vec![h]);
    }

    #[test]
    fn stale_handles_are_detected() {
        let mut graph = ObjectGraph::new();
        let old = graph.create("A", None).unwrap();
        graph.destroy(old).unwrap();
        let new = graph.create("B", None).unwrap();
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(graph.get(old).is_none());
        assert!(matches!(
            graph.set_property(old, "x", Variant::Int(1)),
            Err(ObjectError::DeadHandle(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Tree structure
    // -----------------------------------------------------------------------

    #[test]
    fn children_keep_insertion_order() {
        let mut graph = ObjectGraph::new();
        let root = graph.create("Root", None).unwrap();
        let a = graph.create("Item", Some(root)).unwrap();
        let b = graph.create("Item", Some(root)).unwrap();
        let c = graph.create("Item", Some(root)).unwrap();
        assert_eq!(graph.children(root), &[a, b, c]);
        assert_eq!(graph.previous_sibling(b), Some(a));
        assert_eq!(graph.next_sibling(b), Some(c));
        assert_eq!(graph.previous_sibling(a), None);
        assert_eq!(graph.next_sibling(c), None);
        assert_eq!(graph.previous_sibling(root), None);
    }

    #[test]
    fn destroy_removes_subtree() {
        let mut graph = ObjectGraph::new();
        let root = graph.create("Root", None).unwrap();
        let child = graph.create("Item", Some(root)).unwrap();
        let grandchild = graph.create("Item", Some(child)).unwrap();
        let other = graph.create("Item", Some(root)).unwrap();

        let destroyed = graph.destroy(child).unwrap();
        assert_eq!(destroyed, vec![grandchild, child]);
        assert_eq!(graph.children(root), &[other]);
        assert!(!graph.contains(grandchild));
    }

    #[test]
    fn set_parent_moves_and_rejects_cycles() {
        let mut graph = ObjectGraph::new();
        let a = graph.create("N", None).unwrap();
        let b = graph.create("N", Some(a)).unwrap();
        let c = graph.create("N", None).unwrap();

        graph.set_parent(b, Some(c)).unwrap();
        assert!(graph.children(a).is_empty());
        assert_eq!(graph.children(c), &[b]);

        let err = graph.set_parent(c, Some(b)).unwrap_err();
        assert!(matches!(err, ObjectError::CyclicParent { .. }));
        let err = graph.set_parent(c, Some(c)).unwrap_err();
        assert!(matches!(err, ObjectError::CyclicParent { .. }));
    }

    #[test]
    fn reorder_children_partial_order() {
        let mut graph = ObjectGraph::new();
        let root = graph.create("Root", None).unwrap();
        let a = graph.create("Item", Some(root)).unwrap();
        let b = graph.create("Item", Some(root)).unwrap();
        let c = graph.create("Item", Some(root)).unwrap();
        let stranger = graph.create("Item", None).unwrap();

        graph.reorder_children(root, &[c, stranger, a]).unwrap();
        assert_eq!(graph.children(root), &[c, a, b]);
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    #[test]
    fn only_observed_objects_journal_events() {
        let mut graph = ObjectGraph::new();
        let watched = graph.create("A", None).unwrap();
        let unwatched = graph.create("A", None).unwrap();
        graph.observe(watched).unwrap();

        graph.set_property(watched, "x", Variant::Int(1)).unwrap();
        graph.set_property(unwatched, "x", Variant::Int(1)).unwrap();
        graph.set_property_quiet(watched, "y", Variant::Int(2)).unwrap();
        graph.destroy(watched).unwrap();

        assert_eq!(
            graph.drain_events(),
            vec![GraphEvent::Modified(watched), GraphEvent::Destroyed(watched)]
        );
        assert!(graph.drain_events().is_empty());
    }

    #[test]
    fn unobserve_stops_journaling() {
        let mut graph = ObjectGraph::new();
        let h = graph.create("A", None).unwrap();
        graph.observe(h).unwrap();
        assert!(graph.is_observed(h));
        graph.unobserve(h).unwrap();
        graph.set_property(h, "x", Variant::Int(1)).unwrap();
        assert!(graph.drain_events().is_empty());
    }
}
