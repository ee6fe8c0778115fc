//! Graph storer: object graph to triples.
//!
//! For each object the storer allocates or reuses a node, refreshes its
//! `rdf:type`, property, parent and follows statements, then recurses into
//! related objects as the [`FollowPolicy`] allows. Property statements are
//! replaced by difference: only statements not in the new value set are
//! removed and only missing ones are added, so anonymous structures that did
//! not change are left alone.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tether_object::{
    from_variant, node_equal, ContainerKind, Handle, ObjectError, ObjectGraph, PropertyDescriptor,
    ScalarType, TypeDescriptor, TypeRegistry, ValueType, Variant,
};
use tether_store::TripleStore;
use tether_types::vocab::rdf;
use tether_types::{Node, Triple};
use tracing::{debug, warn};

use crate::config::{BlankNodePolicy, FollowPolicy, PropertyStorePolicy, StoreConfig, Vocabulary};
use crate::error::MapperResult;
use crate::gc::collect_garbage;
use crate::list::{read_list, write_list};
use crate::map::NodeMap;

/// Name of the property carrying an object's persisted Uri, if any.
pub(crate) fn identity_property<'d>(
    desc: &'d TypeDescriptor,
    vocabulary: &Vocabulary,
) -> Option<&'d str> {
    desc.identity_property()
        .or_else(|| {
            desc.find_property(&vocabulary.identity_property)
                .filter(|p| *p.value_type() == ValueType::Scalar(ScalarType::Uri))
        })
        .map(PropertyDescriptor::name)
}

/// One store pass over an object graph.
///
/// The examined set lives as long as the storer, so objects reached more
/// than once in a pass are written once.
pub struct GraphStorer<'a> {
    store: &'a dyn TripleStore,
    registry: &'a TypeRegistry,
    vocabulary: &'a Vocabulary,
    config: StoreConfig,
    examined: BTreeSet<Handle>,
    written: BTreeSet<Node>,
    defaults: HashMap<String, Option<BTreeMap<String, Variant>>>,
    stored: Vec<Handle>,
}

impl<'a> GraphStorer<'a> {
    pub fn new(
        store: &'a dyn TripleStore,
        registry: &'a TypeRegistry,
        vocabulary: &'a Vocabulary,
        config: StoreConfig,
    ) -> Self {
        Self {
            store,
            registry,
            vocabulary,
            config,
            examined: BTreeSet::new(),
            written: BTreeSet::new(),
            defaults: HashMap::new(),
            stored: Vec::new(),
        }
    }

    /// Objects written so far in this pass, in write order.
    pub fn stored(&self) -> &[Handle] {
        &self.stored
    }

    /// Store one object and whatever the follow policy reaches from it.
    /// Returns the object's node.
    pub fn store(
        &mut self,
        graph: &mut ObjectGraph,
        object: Handle,
        map: &mut NodeMap,
    ) -> MapperResult<Node> {
        self.store_object(graph, object, map)
    }

    /// Store a batch, skipping objects that fail. Returns the objects that
    /// were stored.
    pub fn store_all(
        &mut self,
        graph: &mut ObjectGraph,
        objects: &[Handle],
        map: &mut NodeMap,
    ) -> Vec<Handle> {
        let mut stored = Vec::with_capacity(objects.len());
        for &object in objects {
            match self.store_object(graph, object, map) {
                Ok(_) => stored.push(object),
                Err(e) => warn!(object = %object, error = %e, "failed to store object"),
            }
        }
        stored
    }

    fn store_object(
        &mut self,
        graph: &mut ObjectGraph,
        object: Handle,
        map: &mut NodeMap,
    ) -> MapperResult<Node> {
        if self.examined.contains(&object) {
            if let Some(node) = map.get(&object) {
                return Ok(node.clone());
            }
        }
        self.examined.insert(object);

        let type_name = graph
            .get(object)
            .ok_or(ObjectError::DeadHandle(object))?
            .type_name()
            .to_string();
        let registry = self.registry;
        let desc = registry.descriptor(&type_name)?;
        let node = self.allocate(graph, object, desc, map)?;
        self.written.insert(node.clone());

        let class = Node::uri(desc.class_uri(&self.vocabulary.class_prefix));
        self.replace(&node, &Node::uri(rdf::TYPE), vec![class])?;

        let identity = identity_property(desc, self.vocabulary);
        for prop in desc.persistent_properties() {
            if Some(prop.name()) == identity {
                continue;
            }
            let predicate = self.vocabulary.property(prop.name());
            let values = self.encode_property(graph, object, desc, prop, &node, &predicate, map)?;
            self.replace(&node, &predicate, values)?;
        }

        let parent = graph.parent(object);
        match self.link(graph, parent, FollowPolicy::PARENT, map) {
            Ok(parent) => {
                self.replace(&node, &self.vocabulary.parent(), parent.into_iter().collect())?
            }
            Err(e) => warn!(object = %object, error = %e, "parent not stored, link kept"),
        }

        let previous = graph.previous_sibling(object);
        match self.link(graph, previous, FollowPolicy::SIBLINGS, map) {
            Ok(previous) => {
                self.replace(&node, &self.vocabulary.follows(), previous.into_iter().collect())?
            }
            Err(e) => warn!(object = %object, error = %e, "sibling not stored, link kept"),
        }

        self.stored.push(object);
        debug!(object = %object, node = %node, type_name = %type_name, "stored object");

        if self.config.follow.contains(FollowPolicy::CHILDREN) {
            let children: Vec<Handle> = graph
                .children(object)
                .iter()
                .filter(|c| !self.examined.contains(*c))
                .copied()
                .collect();
            for child in children {
                if let Err(e) = self.store_object(graph, child, map) {
                    warn!(object = %child, parent = %object, error = %e, "skipping child");
                }
            }
        }
        if self.config.follow.contains(FollowPolicy::SIBLINGS) {
            if let Some(next) = graph.next_sibling(object) {
                if !self.examined.contains(&next) {
                    if let Err(e) = self.store_object(graph, next, map) {
                        warn!(object = %next, previous = %object, error = %e, "skipping sibling");
                    }
                }
            }
        }
        Ok(node)
    }

    fn link(
        &mut self,
        graph: &mut ObjectGraph,
        target: Option<Handle>,
        follow: FollowPolicy,
        map: &mut NodeMap,
    ) -> MapperResult<Option<Node>> {
        match target {
            Some(target) => self.reference(graph, target, follow, map),
            None => Ok(None),
        }
    }

    /// Node of a related object, storing it first when it has no node yet
    /// or the policy bit asks for it.
    fn reference(
        &mut self,
        graph: &mut ObjectGraph,
        target: Handle,
        follow: FollowPolicy,
        map: &mut NodeMap,
    ) -> MapperResult<Option<Node>> {
        if !graph.contains(target) {
            warn!(object = %target, "dropping reference to destroyed object");
            return Ok(None);
        }
        if let Some(node) = map.get(&target) {
            if self.examined.contains(&target) || !self.config.follow.contains(follow) {
                return Ok(Some(node.clone()));
            }
        }
        self.store_object(graph, target, map).map(Some)
    }

    /// Identity Uri property > existing mapping > anonymous node >
    /// synthesized Uri.
    fn allocate(
        &mut self,
        graph: &mut ObjectGraph,
        object: Handle,
        desc: &TypeDescriptor,
        map: &mut NodeMap,
    ) -> MapperResult<Node> {
        let identity = identity_property(desc, self.vocabulary);
        if let Some(Variant::Uri(uri)) = identity.and_then(|name| graph.property(object, name)) {
            let node = self.store.expand_node(&Node::uri(uri.clone()));
            map.insert(object, node.clone());
            return Ok(node);
        }
        if let Some(node) = map.get(&object) {
            return Ok(node.clone());
        }
        let node = match self.config.blank_nodes {
            BlankNodePolicy::AsNeeded => self.store.add_blank_node()?,
            BlankNodePolicy::NoBlankNodes => {
                let node = self
                    .store
                    .unique_uri(&self.vocabulary.instance_prefix_for(desc.name()))?;
                if let (Some(name), Some(uri)) = (identity, node.as_uri()) {
                    graph.set_property_quiet(object, name, Variant::Uri(uri.to_string()))?;
                }
                node
            }
        };
        debug!(object = %object, node = %node, "allocated node");
        map.insert(object, node.clone());
        Ok(node)
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_property(
        &mut self,
        graph: &mut ObjectGraph,
        object: Handle,
        desc: &TypeDescriptor,
        prop: &PropertyDescriptor,
        subject: &Node,
        predicate: &Node,
        map: &mut NodeMap,
    ) -> MapperResult<Vec<Node>> {
        let value = graph
            .property(object, prop.name())
            .cloned()
            .unwrap_or_else(|| prop.default_value().clone());
        if self.config.properties == PropertyStorePolicy::IfChanged
            && !self.differs_from_default(desc, prop, &value)
        {
            return Ok(Vec::new());
        }

        match prop.value_type() {
            ValueType::Scalar(_) if value.is_null() => Ok(Vec::new()),
            ValueType::Scalar(_) => Ok(vec![self.store.expand_node(&from_variant(&value)?)]),
            ValueType::Object(_) => Ok(self.encode_element(graph, &value, map)?.into_iter().collect()),
            ValueType::Container(_) if value.is_null() => Ok(Vec::new()),
            ValueType::Container(container) => {
                let kind = self.registry.container(container)?.kind;
                let items = self.registry.extract_container(container, &value)?;
                let mut elements = Vec::with_capacity(items.len());
                for item in &items {
                    if let Some(node) = self.encode_element(graph, item, map)? {
                        elements.push(node);
                    }
                }
                match kind {
                    ContainerKind::Set => Ok(elements),
                    ContainerKind::Sequence => {
                        Ok(vec![self.sequence_head(subject, predicate, &elements)?])
                    }
                }
            }
        }
    }

    fn encode_element(
        &mut self,
        graph: &mut ObjectGraph,
        value: &Variant,
        map: &mut NodeMap,
    ) -> MapperResult<Option<Node>> {
        match value {
            Variant::Null => Ok(None),
            Variant::Object(target) => {
                self.reference(graph, *target, FollowPolicy::OBJECT_PROPERTIES, map)
            }
            other => Ok(Some(self.store.expand_node(&from_variant(other)?))),
        }
    }

    /// Head of a list holding `elements`, reusing the current chain when it
    /// already holds exactly these elements.
    fn sequence_head(
        &mut self,
        subject: &Node,
        predicate: &Node,
        elements: &[Node],
    ) -> MapperResult<Node> {
        if elements.is_empty() {
            return Ok(Node::uri(rdf::NIL));
        }
        let current = self.store.match_triples(&Triple::new(
            subject.clone(),
            self.store.expand_node(predicate),
            Node::Nothing,
        ))?;
        for triple in current {
            if triple.object.is_blank()
                && read_list(self.store, &triple.object)?.as_deref() == Some(elements)
            {
                return Ok(triple.object);
            }
        }
        Ok(write_list(self.store, elements)?)
    }

    /// Whether a property must be written under [`PropertyStorePolicy::IfChanged`].
    ///
    /// Object and container values always count as changed. Types that
    /// cannot be default-constructed fall back to always writing.
    fn differs_from_default(
        &mut self,
        desc: &TypeDescriptor,
        prop: &PropertyDescriptor,
        value: &Variant,
    ) -> bool {
        if !matches!(prop.value_type(), ValueType::Scalar(_)) {
            return true;
        }
        let registry = self.registry;
        let defaults = self
            .defaults
            .entry(desc.name().to_string())
            .or_insert_with(|| match registry.default_values(desc.name()) {
                Ok(values) => Some(values),
                Err(e) => {
                    debug!(type_name = desc.name(), error = %e, "no default instance");
                    None
                }
            });
        match defaults {
            Some(values) => {
                let default = values.get(prop.name()).unwrap_or(&Variant::Null);
                !node_equal(value, default)
            }
            None => true,
        }
    }

    /// Make `values` the exact object set of `subject predicate *`.
    fn replace(&mut self, subject: &Node, predicate: &Node, values: Vec<Node>) -> MapperResult<()> {
        let predicate = self.store.expand_node(predicate);
        let mut wanted: Vec<Node> = Vec::with_capacity(values.len());
        for value in values {
            let value = self.store.expand_node(&value);
            if !wanted.contains(&value) {
                wanted.push(value);
            }
        }
        let existing: Vec<Node> = self
            .store
            .match_triples(&Triple::new(subject.clone(), predicate.clone(), Node::Nothing))?
            .into_iter()
            .map(|t| t.object)
            .collect();

        for value in &wanted {
            if !existing.contains(value) {
                self.store
                    .add(&Triple::new(subject.clone(), predicate.clone(), value.clone()))?;
            }
        }
        for old in existing {
            if wanted.contains(&old) {
                continue;
            }
            self.store
                .remove(&Triple::new(subject.clone(), predicate.clone(), old.clone()))?;
            if old.is_blank() {
                collect_garbage(self.store, &old, &self.written)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_object::{ContainerBinding, ElementType};
    use tether_store::InMemoryTripleStore;
    use tether_types::vocab::xsd;

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_container(
            "Strings",
            ContainerBinding::sequence(ElementType::Scalar(ScalarType::String)),
        );
        reg.register_container(
            "People",
            ContainerBinding::set(ElementType::Object("Person".into())),
        );
        reg.register(
            TypeDescriptor::new("Person")
                .property(PropertyDescriptor::identity("uri"))
                .property(PropertyDescriptor::scalar("name", ScalarType::String))
                .property(PropertyDescriptor::scalar("age", ScalarType::Int).with_default(0))
                .property(PropertyDescriptor::object("friend", "Person"))
                .property(PropertyDescriptor::container("colours", "Strings"))
                .property(PropertyDescriptor::container("knows", "People"))
                .property(PropertyDescriptor::scalar("cache", ScalarType::Int).not_stored()),
        );
        reg.register(
            TypeDescriptor::new("Item")
                .with_parent()
                .property(PropertyDescriptor::scalar("label", ScalarType::String)),
        );
        reg
    }

    fn count(store: &InMemoryTripleStore, predicate: &str) -> usize {
        store
            .match_triples(&Triple::new(Node::Nothing, Node::uri(predicate), Node::Nothing))
            .unwrap()
            .len()
    }

    fn prop(name: &str) -> String {
        format!("urn:tether:property#{name}")
    }

    // -----------------------------------------------------------------------
    // Node allocation
    // -----------------------------------------------------------------------

    #[test]
    fn identity_property_names_the_node() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let p = reg.build("Person", &mut graph, None).unwrap();
        graph
            .set_property(p, "uri", Variant::Uri("urn:alice".into()))
            .unwrap();

        let mut map = NodeMap::new();
        let mut storer = GraphStorer::new(&store, &reg, &vocab, StoreConfig::default());
        let node = storer.store(&mut graph, p, &mut map).unwrap();
        assert_eq!(node, Node::uri("urn:alice"));
        assert_eq!(map[&p], node);
        assert!(store
            .contains(&Triple::new(
                node,
                Node::uri(rdf::TYPE),
                Node::uri("urn:tether:class#Person")
            ))
            .unwrap());
    }

    #[test]
    fn anonymous_node_when_allowed() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let p = reg.build("Person", &mut graph, None).unwrap();
        let mut map = NodeMap::new();
        let node = GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, p, &mut map)
            .unwrap();
        assert!(node.is_blank());
        assert_eq!(graph.property(p, "uri"), Some(&Variant::Null));
    }

    #[test]
    fn synthesized_uri_is_written_back_quietly() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let config = StoreConfig {
            blank_nodes: BlankNodePolicy::NoBlankNodes,
            ..StoreConfig::default()
        };
        let mut graph = ObjectGraph::new();
        let p = reg.build("Person", &mut graph, None).unwrap();
        graph.observe(p).unwrap();
        let mut map = NodeMap::new();
        let node = GraphStorer::new(&store, &reg, &vocab, config)
            .store(&mut graph, p, &mut map)
            .unwrap();
        let uri = node.as_uri().unwrap().to_string();
        assert!(uri.starts_with("urn:tether:instance:Person/"));
        assert_eq!(graph.property(p, "uri"), Some(&Variant::Uri(uri)));
        assert!(graph.drain_events().is_empty());
    }

    // -----------------------------------------------------------------------
    // Property encoding
    // -----------------------------------------------------------------------

    #[test]
    fn scalar_property_triples() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let p = reg.build("Person", &mut graph, None).unwrap();
        graph.set_property(p, "age", Variant::Int(42)).unwrap();
        graph.set_property(p, "cache", Variant::Int(9)).unwrap();
        let mut map = NodeMap::new();
        let node = GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, p, &mut map)
            .unwrap();

        assert!(store
            .contains(&Triple::new(
                node,
                Node::uri(prop("age")),
                Node::typed_literal("42", xsd::INTEGER)
            ))
            .unwrap());
        assert_eq!(count(&store, &prop("name")), 0);
        assert_eq!(count(&store, &prop("cache")), 0);
        assert_eq!(count(&store, &prop("uri")), 0);
    }

    #[test]
    fn sequence_becomes_a_cons_chain() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let p = reg.build("Person", &mut graph, None).unwrap();
        graph
            .set_property(p, "colours", Variant::from(vec!["turquoise", "red", "black"]))
            .unwrap();
        let mut map = NodeMap::new();
        GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, p, &mut map)
            .unwrap();

        assert_eq!(count(&store, rdf::FIRST), 3);
        assert_eq!(count(&store, rdf::REST), 3);
        assert_eq!(
            store
                .match_triples(&Triple::new(Node::Nothing, Node::uri(rdf::REST), Node::uri(rdf::NIL)))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn set_members_are_one_triple_each() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let a = reg.build("Person", &mut graph, None).unwrap();
        let b = reg.build("Person", &mut graph, None).unwrap();
        let c = reg.build("Person", &mut graph, None).unwrap();
        graph
            .set_property(a, "knows", Variant::List(vec![b.into(), c.into(), b.into()]))
            .unwrap();
        let mut map = NodeMap::new();
        let mut storer = GraphStorer::new(&store, &reg, &vocab, StoreConfig::default());
        storer.store(&mut graph, a, &mut map).unwrap();

        assert_eq!(count(&store, &prop("knows")), 2);
        assert_eq!(storer.stored().len(), 3);
        assert_eq!(count(&store, rdf::TYPE), 3);
    }

    #[test]
    fn if_changed_skips_default_values() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let config = StoreConfig {
            properties: PropertyStorePolicy::IfChanged,
            ..StoreConfig::default()
        };
        let mut graph = ObjectGraph::new();
        let p = reg.build("Person", &mut graph, None).unwrap();
        graph.set_property(p, "name", Variant::from("Ada")).unwrap();
        let mut map = NodeMap::new();
        GraphStorer::new(&store, &reg, &vocab, config)
            .store(&mut graph, p, &mut map)
            .unwrap();
        assert_eq!(count(&store, &prop("age")), 0);
        assert_eq!(count(&store, &prop("name")), 1);

        graph.set_property(p, "age", Variant::Int(3)).unwrap();
        GraphStorer::new(&store, &reg, &vocab, config)
            .store(&mut graph, p, &mut map)
            .unwrap();
        assert_eq!(count(&store, &prop("age")), 1);

        graph.set_property(p, "age", Variant::Int(0)).unwrap();
        GraphStorer::new(&store, &reg, &vocab, config)
            .store(&mut graph, p, &mut map)
            .unwrap();
        assert_eq!(count(&store, &prop("age")), 0);
    }

    // -----------------------------------------------------------------------
    // Structure and follow policy
    // -----------------------------------------------------------------------

    #[test]
    fn parent_and_follows_links() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let root = reg.build("Person", &mut graph, None).unwrap();
        let first = reg.build("Item", &mut graph, Some(root)).unwrap();
        let second = reg.build("Item", &mut graph, Some(root)).unwrap();
        let mut map = NodeMap::new();
        GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, root, &mut map)
            .unwrap();

        assert!(store
            .contains(&Triple::new(map[&first].clone(), vocab.parent(), map[&root].clone()))
            .unwrap());
        assert!(store
            .contains(&Triple::new(map[&second].clone(), vocab.follows(), map[&first].clone()))
            .unwrap());
        assert_eq!(
            store
                .match_triples(&Triple::new(Node::Nothing, vocab.follows(), Node::Nothing))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn no_follow_still_stores_unknown_references() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let config = StoreConfig {
            follow: FollowPolicy::NONE,
            ..StoreConfig::default()
        };
        let mut graph = ObjectGraph::new();
        let a = reg.build("Person", &mut graph, None).unwrap();
        let b = reg.build("Person", &mut graph, None).unwrap();
        let child = reg.build("Item", &mut graph, Some(a)).unwrap();
        graph.set_property(a, "friend", b.into()).unwrap();

        let mut map = NodeMap::new();
        let mut storer = GraphStorer::new(&store, &reg, &vocab, config);
        storer.store(&mut graph, a, &mut map).unwrap();
        assert!(map.contains_key(&b));
        assert!(!map.contains_key(&child));

        // B is known now; without the follow bit a later pass only refers to it.
        graph.set_property(b, "age", Variant::Int(5)).unwrap();
        let mut storer = GraphStorer::new(&store, &reg, &vocab, config);
        storer.store(&mut graph, a, &mut map).unwrap();
        assert_eq!(storer.stored(), &[a]);
        assert_eq!(count(&store, &prop("age")), 2);
        assert!(!store
            .contains(&Triple::new(
                map[&b].clone(),
                Node::uri(prop("age")),
                Node::typed_literal("5", xsd::INTEGER)
            ))
            .unwrap());
    }

    #[test]
    fn storing_twice_is_idempotent() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let a = reg.build("Person", &mut graph, None).unwrap();
        let b = reg.build("Person", &mut graph, None).unwrap();
        graph.set_property(a, "friend", b.into()).unwrap();
        graph
            .set_property(a, "colours", Variant::from(vec!["red", "blue"]))
            .unwrap();
        reg.build("Item", &mut graph, Some(a)).unwrap();

        let mut map = NodeMap::new();
        GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, a, &mut map)
            .unwrap();
        let once = store.len().unwrap();
        GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, a, &mut map)
            .unwrap();
        assert_eq!(store.len().unwrap(), once);
        assert_eq!(count(&store, rdf::TYPE), 3);
    }

    #[test]
    fn replacing_a_sequence_collects_the_old_chain() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let p = reg.build("Person", &mut graph, None).unwrap();
        graph
            .set_property(p, "colours", Variant::from(vec!["a", "b", "c"]))
            .unwrap();
        let mut map = NodeMap::new();
        GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, p, &mut map)
            .unwrap();
        graph
            .set_property(p, "colours", Variant::from(vec!["z"]))
            .unwrap();
        GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, p, &mut map)
            .unwrap();
        assert_eq!(count(&store, rdf::FIRST), 1);
        assert_eq!(count(&store, rdf::REST), 1);
    }

    #[test]
    fn batch_store_reports_partial_success() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let good = reg.build("Person", &mut graph, None).unwrap();
        let unknown = graph.create("Unregistered", None).unwrap();
        let mut map = NodeMap::new();
        let stored = GraphStorer::new(&store, &reg, &vocab, StoreConfig::default()).store_all(
            &mut graph,
            &[good, unknown],
            &mut map,
        );
        assert_eq!(stored, vec![good]);
    }

    #[test]
    fn failing_child_does_not_fail_its_owner() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let owner = reg.build("Person", &mut graph, None).unwrap();
        let item = reg.build("Item", &mut graph, Some(owner)).unwrap();
        graph.create("Unregistered", Some(owner)).unwrap();

        let mut map = NodeMap::new();
        let mut storer = GraphStorer::new(&store, &reg, &vocab, StoreConfig::default());
        let stored = storer.store_all(&mut graph, &[owner], &mut map);
        assert_eq!(stored, vec![owner]);
        assert_eq!(storer.stored(), &[owner, item]);
        assert!(store
            .contains(&Triple::new(
                map[&item].clone(),
                vocab.parent(),
                map[&owner].clone()
            ))
            .unwrap());
    }
}
