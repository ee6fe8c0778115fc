//! Graph loader: triples to object graph.
//!
//! Loading a node resolves its type from `rdf:type`, constructs the object
//! (under its parent when one is available), records it in the node map
//! *before* reading properties so reference cycles resolve to the object
//! under construction, then decodes every persistent property. A property
//! that fails to decode or assign is logged and skipped; it never aborts the
//! object.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tether_object::{
    to_variant, ContainerKind, ElementType, Handle, ObjectGraph, PropertyDescriptor, RegistryError,
    TypeDescriptor, TypeRegistry, ValueType, Variant,
};
use tether_store::TripleStore;
use tether_types::vocab::rdf;
use tether_types::{Node, Triple};
use tracing::{debug, warn};

use crate::config::{AbsentPropertyPolicy, FollowPolicy, LoadConfig, Vocabulary};
use crate::error::{LoadError, LoadResult};
use crate::list::read_list;
use crate::map::ObjectMap;
use crate::storer::identity_property;

/// One load pass over a store.
pub struct GraphLoader<'a> {
    store: &'a dyn TripleStore,
    registry: &'a TypeRegistry,
    vocabulary: &'a Vocabulary,
    config: LoadConfig,
    examined: BTreeSet<Node>,
    parents: BTreeSet<Handle>,
    defaults: HashMap<String, Option<BTreeMap<String, Variant>>>,
    loaded: Vec<Handle>,
}

impl<'a> GraphLoader<'a> {
    pub fn new(
        store: &'a dyn TripleStore,
        registry: &'a TypeRegistry,
        vocabulary: &'a Vocabulary,
        config: LoadConfig,
    ) -> Self {
        Self {
            store,
            registry,
            vocabulary,
            config,
            examined: BTreeSet::new(),
            parents: BTreeSet::new(),
            defaults: HashMap::new(),
            loaded: Vec::new(),
        }
    }

    /// Objects constructed so far in this pass.
    pub fn loaded(&self) -> &[Handle] {
        &self.loaded
    }

    /// Load the object at `node`, or return the mapped one.
    ///
    /// `hint` names the type to construct when the node has no mapped
    /// `rdf:type`.
    pub fn load(
        &mut self,
        graph: &mut ObjectGraph,
        node: &Node,
        hint: Option<&str>,
        map: &mut ObjectMap,
    ) -> LoadResult<Handle> {
        let object = self.load_node(graph, node, hint, map)?;
        self.restore_sibling_order(graph, map)?;
        Ok(object)
    }

    /// Load every instance of a class. Instances that fail are skipped.
    pub fn load_type(
        &mut self,
        graph: &mut ObjectGraph,
        class: &Node,
        map: &mut ObjectMap,
    ) -> LoadResult<Vec<Handle>> {
        let subjects: BTreeSet<Node> = self
            .store
            .match_triples(&Triple::new(Node::Nothing, Node::uri(rdf::TYPE), class.clone()))?
            .into_iter()
            .map(|t| t.subject)
            .collect();
        self.load_batch(graph, subjects, map)
    }

    /// Load every typed node in the store. Nodes that fail are skipped.
    pub fn load_all(
        &mut self,
        graph: &mut ObjectGraph,
        map: &mut ObjectMap,
    ) -> LoadResult<Vec<Handle>> {
        let subjects: BTreeSet<Node> = self
            .store
            .match_triples(&Triple::new(Node::Nothing, Node::uri(rdf::TYPE), Node::Nothing))?
            .into_iter()
            .map(|t| t.subject)
            .collect();
        self.load_batch(graph, subjects, map)
    }

    fn load_batch(
        &mut self,
        graph: &mut ObjectGraph,
        nodes: BTreeSet<Node>,
        map: &mut ObjectMap,
    ) -> LoadResult<Vec<Handle>> {
        // owners first, so owned objects find their parent already mapped
        let parent = self.store.expand_node(&self.vocabulary.parent());
        let mut ordered = Vec::with_capacity(nodes.len());
        let mut owned = Vec::new();
        for node in nodes {
            if self
                .store
                .contains(&Triple::new(node.clone(), parent.clone(), Node::Nothing))?
            {
                owned.push(node);
            } else {
                ordered.push(node);
            }
        }
        ordered.extend(owned);

        let mut objects = Vec::with_capacity(ordered.len());
        for node in ordered {
            match self.load_node(graph, &node, None, map) {
                Ok(object) => objects.push(object),
                Err(LoadError::Store(e)) => return Err(LoadError::Store(e)),
                Err(e) => warn!(node = %node, error = %e, "skipping node"),
            }
        }
        self.restore_sibling_order(graph, map)?;
        Ok(objects)
    }

    /// Refresh mapped objects from the store in place.
    ///
    /// A mapped object whose node is no longer the subject of any statement
    /// is destroyed and unmapped. Unmapped nodes are ignored. Returns the
    /// refreshed objects.
    pub fn reload(
        &mut self,
        graph: &mut ObjectGraph,
        nodes: &[Node],
        map: &mut ObjectMap,
    ) -> LoadResult<Vec<Handle>> {
        let mut refreshed = Vec::new();
        for node in nodes {
            let node = self.store.expand_node(node);
            let Some(&object) = map.get(&node) else {
                continue;
            };
            if !graph.contains(object) {
                map.remove(&node);
                continue;
            }
            let present = self
                .store
                .contains(&Triple::new(node.clone(), Node::Nothing, Node::Nothing))?;
            if !present {
                let destroyed = graph.destroy(object)?;
                map.retain(|_, o| !destroyed.contains(o));
                debug!(node = %node, objects = destroyed.len(), "reload destroyed object");
                continue;
            }

            self.examined.insert(node.clone());
            let type_name = graph
                .get(object)
                .map(|o| o.type_name().to_string())
                .unwrap_or_default();
            let registry = self.registry;
            let desc = registry.descriptor(&type_name)?;
            self.load_properties(graph, object, &node, desc, map)?;

            if let Some(parent) = self.load_parent(graph, &node, map)? {
                if graph.parent(object) != Some(parent) {
                    if let Err(e) = graph.set_parent(object, Some(parent)) {
                        warn!(node = %node, error = %e, "cannot move reloaded object");
                    }
                }
            }
            if let Some(parent) = graph.parent(object) {
                self.parents.insert(parent);
            }
            refreshed.push(object);
        }
        self.restore_sibling_order(graph, map)?;
        Ok(refreshed)
    }

    fn load_node(
        &mut self,
        graph: &mut ObjectGraph,
        node: &Node,
        hint: Option<&str>,
        map: &mut ObjectMap,
    ) -> LoadResult<Handle> {
        let node = self.store.expand_node(node);
        if let Some(&object) = map.get(&node) {
            if graph.contains(object) {
                return Ok(object);
            }
        }
        if !node.is_resource() {
            return Err(LoadError::NotAResource(node));
        }
        self.examined.insert(node.clone());
        let result = self.construct(graph, &node, hint, map);
        if result.is_err() && !map.contains_key(&node) {
            // retried if reached again, e.g. once its parent is loaded
            self.examined.remove(&node);
        }
        result
    }

    fn construct(
        &mut self,
        graph: &mut ObjectGraph,
        node: &Node,
        hint: Option<&str>,
        map: &mut ObjectMap,
    ) -> LoadResult<Handle> {
        let node = node.clone();
        let type_name = self.resolve_type(&node, hint)?;
        let parent = self.load_parent(graph, &node, map)?;
        let registry = self.registry;
        let object = registry
            .build(&type_name, graph, parent)
            .map_err(|e| match e {
                RegistryError::UnknownType(_) => LoadError::UnknownType {
                    node: node.clone(),
                    type_uri: None,
                },
                other => LoadError::ConstructionFailed {
                    node: node.clone(),
                    type_name: type_name.clone(),
                    reason: other.to_string(),
                },
            })?;
        map.insert(node.clone(), object);
        self.loaded.push(object);
        if let Some(parent) = parent {
            self.parents.insert(parent);
        }

        let desc = registry.descriptor(&type_name)?;
        if let (Some(name), Some(uri)) = (identity_property(desc, self.vocabulary), node.as_uri()) {
            graph.set_property_quiet(object, name, Variant::Uri(uri.to_string()))?;
        }
        self.load_properties(graph, object, &node, desc, map)?;
        debug!(node = %node, object = %object, type_name = %type_name, "loaded object");

        if self.config.follow.contains(FollowPolicy::CHILDREN) {
            let children = self.subjects_linking(&self.vocabulary.parent(), &node)?;
            self.load_related(graph, children, map)?;
            self.parents.insert(object);
        }
        if self.config.follow.contains(FollowPolicy::SIBLINGS) {
            let follows = self.vocabulary.follows();
            let mut siblings = self.subjects_linking(&follows, &node)?;
            siblings.extend(
                self.store
                    .match_triples(&Triple::new(
                        node.clone(),
                        self.store.expand_node(&follows),
                        Node::Nothing,
                    ))?
                    .into_iter()
                    .map(|t| t.object),
            );
            self.load_related(graph, siblings, map)?;
        }
        Ok(object)
    }

    fn subjects_linking(&self, predicate: &Node, object: &Node) -> LoadResult<Vec<Node>> {
        Ok(self
            .store
            .match_triples(&Triple::new(
                Node::Nothing,
                self.store.expand_node(predicate),
                object.clone(),
            ))?
            .into_iter()
            .map(|t| t.subject)
            .collect())
    }

    fn load_related(
        &mut self,
        graph: &mut ObjectGraph,
        nodes: Vec<Node>,
        map: &mut ObjectMap,
    ) -> LoadResult<()> {
        let pending: Vec<Node> = nodes
            .into_iter()
            .filter(|n| !self.examined.contains(n))
            .collect();
        for node in pending {
            if self.examined.contains(&node) {
                continue;
            }
            match self.load_node(graph, &node, None, map) {
                Ok(_) => {}
                Err(LoadError::Store(e)) => return Err(LoadError::Store(e)),
                Err(e) => warn!(node = %node, error = %e, "skipping related node"),
            }
        }
        Ok(())
    }

    /// The mapped object's type, falling back to `hint`.
    fn resolve_type(&self, node: &Node, hint: Option<&str>) -> LoadResult<String> {
        let class_prefix = self.store.expand(&self.vocabulary.class_prefix);
        let classes: Vec<Node> = self
            .store
            .match_triples(&Triple::new(node.clone(), Node::uri(rdf::TYPE), Node::Nothing))?
            .into_iter()
            .map(|t| t.object)
            .collect();
        for class in &classes {
            if let Some(name) = class
                .as_uri()
                .and_then(|uri| self.registry.type_for_class_uri(uri, &class_prefix))
            {
                return Ok(name.to_string());
            }
        }
        if let Some(hint) = hint.filter(|h| self.registry.knows(h)) {
            return Ok(hint.to_string());
        }
        Err(LoadError::UnknownType {
            node: node.clone(),
            type_uri: classes.iter().find_map(|c| c.as_uri()).map(str::to_string),
        })
    }

    /// The object to own `node`'s object: the mapped parent, or the parent
    /// loaded first when the follow policy allows.
    fn load_parent(
        &mut self,
        graph: &mut ObjectGraph,
        node: &Node,
        map: &mut ObjectMap,
    ) -> LoadResult<Option<Handle>> {
        let link = self.store.match_first(&Triple::new(
            node.clone(),
            self.store.expand_node(&self.vocabulary.parent()),
            Node::Nothing,
        ))?;
        let Some(parent_node) = link.map(|t| t.object) else {
            return Ok(None);
        };
        if let Some(&parent) = map.get(&parent_node) {
            if graph.contains(parent) {
                return Ok(Some(parent));
            }
        }
        if self.config.follow.contains(FollowPolicy::PARENT) && !self.examined.contains(&parent_node) {
            match self.load_node(graph, &parent_node, None, map) {
                Ok(parent) => return Ok(Some(parent)),
                Err(LoadError::Store(e)) => return Err(LoadError::Store(e)),
                Err(e) => warn!(node = %parent_node, error = %e, "cannot load parent"),
            }
        }
        Ok(None)
    }

    fn load_properties(
        &mut self,
        graph: &mut ObjectGraph,
        object: Handle,
        node: &Node,
        desc: &TypeDescriptor,
        map: &mut ObjectMap,
    ) -> LoadResult<()> {
        let identity = identity_property(desc, self.vocabulary);
        for prop in desc.persistent_properties() {
            if Some(prop.name()) == identity {
                continue;
            }
            let predicate = self.store.expand_node(&self.vocabulary.property(prop.name()));
            let values: Vec<Node> = self
                .store
                .match_triples(&Triple::new(node.clone(), predicate, Node::Nothing))?
                .into_iter()
                .map(|t| t.object)
                .collect();

            let value = if values.is_empty() {
                match self.config.absent {
                    AbsentPropertyPolicy::Ignore => continue,
                    AbsentPropertyPolicy::Reset => self.default_for(desc, prop),
                }
            } else {
                match self.decode_property(graph, prop, &values, map) {
                    Ok(value) => value,
                    Err(LoadError::Store(e)) => return Err(LoadError::Store(e)),
                    Err(e) => {
                        warn!(node = %node, property = prop.name(), error = %e, "skipping undecodable property");
                        continue;
                    }
                }
            };
            if let Err(e) = self.registry.set_property(graph, object, prop.name(), value) {
                warn!(node = %node, property = prop.name(), error = %e, "failed to assign property");
            }
        }
        Ok(())
    }

    fn decode_property(
        &mut self,
        graph: &mut ObjectGraph,
        prop: &PropertyDescriptor,
        values: &[Node],
        map: &mut ObjectMap,
    ) -> LoadResult<Variant> {
        let first = &values[0];
        if values.len() > 1 && !matches!(prop.value_type(), ValueType::Container(_)) {
            debug!(property = prop.name(), count = values.len(), "several values for single-valued property, using the first");
        }
        match prop.value_type() {
            ValueType::Scalar(scalar) => Ok(to_variant(first, Some(*scalar))?),
            ValueType::Object(type_name) => self.resolve_reference(graph, first, Some(type_name.as_str()), map),
            ValueType::Container(container) => {
                let binding = self.registry.container(container)?.clone();
                let nodes = match binding.kind {
                    ContainerKind::Sequence => read_list(self.store, first)?
                        .ok_or_else(|| LoadError::MalformedList(first.clone()))?,
                    ContainerKind::Set => values.to_vec(),
                };
                let mut items = Vec::with_capacity(nodes.len());
                for node in &nodes {
                    items.push(match &binding.element {
                        ElementType::Scalar(scalar) => to_variant(node, Some(*scalar))?,
                        ElementType::Object(type_name) => {
                            self.resolve_reference(graph, node, Some(type_name.as_str()), map)?
                        }
                    });
                }
                Ok(self.registry.inject_container(container, items)?)
            }
        }
    }

    /// The mapped object for `node`, loading it when the follow policy
    /// allows; otherwise the raw reference.
    fn resolve_reference(
        &mut self,
        graph: &mut ObjectGraph,
        node: &Node,
        hint: Option<&str>,
        map: &mut ObjectMap,
    ) -> LoadResult<Variant> {
        let node = self.store.expand_node(node);
        if let Some(&object) = map.get(&node) {
            if graph.contains(object) {
                return Ok(Variant::Object(object));
            }
        }
        if !node.is_resource() {
            return Ok(to_variant(&node, None)?);
        }
        if self.config.follow.contains(FollowPolicy::OBJECT_PROPERTIES)
            && !self.examined.contains(&node)
        {
            match self.load_node(graph, &node, hint, map) {
                Ok(object) => return Ok(Variant::Object(object)),
                Err(LoadError::Store(e)) => return Err(LoadError::Store(e)),
                Err(e) => warn!(node = %node, error = %e, "keeping raw reference"),
            }
        }
        Ok(Variant::Reference(node))
    }

    fn default_for(&mut self, desc: &TypeDescriptor, prop: &PropertyDescriptor) -> Variant {
        let registry = self.registry;
        self.defaults
            .entry(desc.name().to_string())
            .or_insert_with(|| registry.default_values(desc.name()).ok())
            .as_ref()
            .and_then(|values| values.get(prop.name()).cloned())
            .unwrap_or_else(|| prop.default_value().clone())
    }

    /// Reorder the children of every parent touched in this pass to follow
    /// the stored `follows` chain.
    fn restore_sibling_order(&mut self, graph: &mut ObjectGraph, map: &ObjectMap) -> LoadResult<()> {
        if self.parents.is_empty() {
            return Ok(());
        }
        let nodes: BTreeMap<Handle, &Node> = map.iter().map(|(n, o)| (*o, n)).collect();
        let follows = self.store.expand_node(&self.vocabulary.follows());
        for parent in std::mem::take(&mut self.parents) {
            let children = graph.children(parent).to_vec();
            if children.len() < 2 {
                continue;
            }
            let mut previous: BTreeMap<Handle, Handle> = BTreeMap::new();
            for &child in &children {
                let Some(node) = nodes.get(&child) else {
                    continue;
                };
                let link = self.store.match_first(&Triple::new(
                    (*node).clone(),
                    follows.clone(),
                    Node::Nothing,
                ))?;
                if let Some(&prev) = link.and_then(|t| map.get(&t.object)) {
                    if prev != child && children.contains(&prev) {
                        previous.insert(child, prev);
                    }
                }
            }
            let next: BTreeMap<Handle, Handle> = previous.iter().map(|(c, p)| (*p, *c)).collect();

            let mut order = Vec::with_capacity(children.len());
            let mut placed = BTreeSet::new();
            for &head in children.iter().filter(|c| !previous.contains_key(*c)) {
                let mut current = Some(head);
                while let Some(child) = current {
                    if !placed.insert(child) {
                        break;
                    }
                    order.push(child);
                    current = next.get(&child).copied();
                }
            }
            for &child in &children {
                if placed.insert(child) {
                    order.push(child);
                }
            }
            graph.reorder_children(parent, &order)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::map::NodeMap;
    use crate::storer::GraphStorer;
    use tether_object::{ContainerBinding, ScalarType};
    use tether_store::InMemoryTripleStore;
    use tether_types::vocab::xsd;

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_container(
            "Strings",
            ContainerBinding::sequence(ElementType::Scalar(ScalarType::String)),
        );
        reg.register(
            TypeDescriptor::new("Person")
                .property(PropertyDescriptor::identity("uri"))
                .property(PropertyDescriptor::scalar("name", ScalarType::String))
                .property(PropertyDescriptor::scalar("age", ScalarType::Int).with_default(0))
                .property(PropertyDescriptor::object("friend", "Person"))
                .property(PropertyDescriptor::container("colours", "Strings")),
        );
        reg.register(
            TypeDescriptor::new("Item")
                .with_parent()
                .property(PropertyDescriptor::scalar("label", ScalarType::String)),
        );
        reg
    }

    fn add(store: &InMemoryTripleStore, s: &str, p: &str, o: Node) {
        store.add(&Triple::new(Node::uri(s), Node::uri(p), o)).unwrap();
    }

    fn person(store: &InMemoryTripleStore, uri: &str) {
        add(store, uri, rdf::TYPE, Node::uri("urn:tether:class#Person"));
    }

    const AGE: &str = "urn:tether:property#age";
    const FRIEND: &str = "urn:tether:property#friend";

    // -----------------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------------

    #[test]
    fn loads_scalars_and_identity() {
        let store = InMemoryTripleStore::new();
        person(&store, "urn:alice");
        add(&store, "urn:alice", AGE, Node::typed_literal("42", xsd::INTEGER));
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let mut map = ObjectMap::new();

        let mut loader = GraphLoader::new(&store, &reg, &vocab, LoadConfig::default());
        let alice = loader.load(&mut graph, &Node::uri("urn:alice"), None, &mut map).unwrap();
        assert_eq!(graph.property(alice, "age"), Some(&Variant::Int(42)));
        assert_eq!(graph.property(alice, "uri"), Some(&Variant::Uri("urn:alice".into())));
        assert_eq!(map[&Node::uri("urn:alice")], alice);
    }

    #[test]
    fn unknown_type_and_hint_fallback() {
        let store = InMemoryTripleStore::new();
        add(&store, "urn:x", AGE, Node::typed_literal("1", xsd::INTEGER));
        add(&store, "urn:y", rdf::TYPE, Node::uri("urn:elsewhere#Thing"));
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let mut map = ObjectMap::new();
        let mut loader = GraphLoader::new(&store, &reg, &vocab, LoadConfig::default());

        let err = loader.load(&mut graph, &Node::uri("urn:y"), None, &mut map).unwrap_err();
        assert!(matches!(err, LoadError::UnknownType { type_uri: Some(_), .. }));
        let x = loader
            .load(&mut graph, &Node::uri("urn:x"), Some("Person"), &mut map)
            .unwrap();
        assert_eq!(graph.get(x).unwrap().type_name(), "Person");
        assert!(loader
            .load(&mut graph, &Node::literal("lit"), None, &mut map)
            .is_err());
    }

    #[test]
    fn construction_failure_is_reported() {
        let store = InMemoryTripleStore::new();
        add(&store, "urn:orphan", rdf::TYPE, Node::uri("urn:tether:class#Item"));
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let mut map = ObjectMap::new();
        let err = GraphLoader::new(&store, &reg, &vocab, LoadConfig::default())
            .load(&mut graph, &Node::uri("urn:orphan"), None, &mut map)
            .unwrap_err();
        assert!(matches!(err, LoadError::ConstructionFailed { .. }));
        assert!(map.is_empty());
    }

    // -----------------------------------------------------------------------
    // Property decoding
    // -----------------------------------------------------------------------

    #[test]
    fn bad_property_is_skipped_not_fatal() {
        let store = InMemoryTripleStore::new();
        person(&store, "urn:alice");
        add(&store, "urn:alice", AGE, Node::typed_literal("old", xsd::INTEGER));
        add(&store, "urn:alice", "urn:tether:property#name", Node::literal("Alice"));
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let mut map = ObjectMap::new();
        let alice = GraphLoader::new(&store, &reg, &vocab, LoadConfig::default())
            .load(&mut graph, &Node::uri("urn:alice"), None, &mut map)
            .unwrap();
        assert_eq!(graph.property(alice, "age"), Some(&Variant::Int(0)));
        assert_eq!(graph.property(alice, "name"), Some(&Variant::from("Alice")));
    }

    #[test]
    fn no_follow_keeps_raw_references() {
        let store = InMemoryTripleStore::new();
        person(&store, "urn:a");
        person(&store, "urn:b");
        add(&store, "urn:a", FRIEND, Node::uri("urn:b"));
        let reg = registry();
        let vocab = Vocabulary::default();
        let config = LoadConfig {
            follow: FollowPolicy::NONE,
            ..LoadConfig::default()
        };
        let mut graph = ObjectGraph::new();
        let mut map = ObjectMap::new();
        let a = GraphLoader::new(&store, &reg, &vocab, config)
            .load(&mut graph, &Node::uri("urn:a"), None, &mut map)
            .unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(
            graph.property(a, "friend"),
            Some(&Variant::Reference(Node::uri("urn:b")))
        );

        // A mapped target resolves even without following.
        let mut graph = ObjectGraph::new();
        let b = reg.build("Person", &mut graph, None).unwrap();
        let mut map = ObjectMap::new();
        map.insert(Node::uri("urn:b"), b);
        let a = GraphLoader::new(&store, &reg, &vocab, config)
            .load(&mut graph, &Node::uri("urn:a"), None, &mut map)
            .unwrap();
        assert_eq!(graph.property(a, "friend"), Some(&Variant::Object(b)));
    }

    #[test]
    fn reset_policy_assigns_defaults() {
        let store = InMemoryTripleStore::new();
        person(&store, "urn:a");
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let a = reg.build("Person", &mut graph, None).unwrap();
        graph.set_property(a, "age", Variant::Int(99)).unwrap();
        let mut map = ObjectMap::new();
        map.insert(Node::uri("urn:a"), a);

        GraphLoader::new(&store, &reg, &vocab, LoadConfig::default())
            .reload(&mut graph, &[Node::uri("urn:a")], &mut map)
            .unwrap();
        assert_eq!(graph.property(a, "age"), Some(&Variant::Int(99)));

        let config = LoadConfig {
            absent: AbsentPropertyPolicy::Reset,
            ..LoadConfig::default()
        };
        GraphLoader::new(&store, &reg, &vocab, config)
            .reload(&mut graph, &[Node::uri("urn:a")], &mut map)
            .unwrap();
        assert_eq!(graph.property(a, "age"), Some(&Variant::Int(0)));
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    #[test]
    fn children_come_back_in_sibling_order() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let root = reg.build("Person", &mut graph, None).unwrap();
        let labels = ["zeta", "alpha", "mid"];
        for label in labels {
            let item = reg.build("Item", &mut graph, Some(root)).unwrap();
            graph.set_property(item, "label", Variant::from(label)).unwrap();
        }
        let mut nodes = NodeMap::new();
        let root_node = GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, root, &mut nodes)
            .unwrap();

        let mut loaded = ObjectGraph::new();
        let mut map = ObjectMap::new();
        let copy = GraphLoader::new(&store, &reg, &vocab, LoadConfig::default())
            .load(&mut loaded, &root_node, None, &mut map)
            .unwrap();
        let got: Vec<Variant> = loaded
            .children(copy)
            .iter()
            .map(|c| loaded.property(*c, "label").cloned().unwrap())
            .collect();
        assert_eq!(got, labels.iter().map(|l| Variant::from(*l)).collect::<Vec<_>>());
    }

    #[test]
    fn parent_is_loaded_first_when_followed() {
        let store = InMemoryTripleStore::new();
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let root = reg.build("Person", &mut graph, None).unwrap();
        let item = reg.build("Item", &mut graph, Some(root)).unwrap();
        let mut nodes = NodeMap::new();
        GraphStorer::new(&store, &reg, &vocab, StoreConfig::default())
            .store(&mut graph, root, &mut nodes)
            .unwrap();

        let config = LoadConfig {
            follow: FollowPolicy::PARENT,
            ..LoadConfig::default()
        };
        let mut loaded = ObjectGraph::new();
        let mut map = ObjectMap::new();
        let copy = GraphLoader::new(&store, &reg, &vocab, config)
            .load(&mut loaded, &nodes[&item], None, &mut map)
            .unwrap();
        let parent = loaded.parent(copy).unwrap();
        assert_eq!(loaded.get(parent).unwrap().type_name(), "Person");
    }

    #[test]
    fn reload_destroys_vanished_objects() {
        let store = InMemoryTripleStore::new();
        person(&store, "urn:a");
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let mut map = ObjectMap::new();
        let a = GraphLoader::new(&store, &reg, &vocab, LoadConfig::default())
            .load(&mut graph, &Node::uri("urn:a"), None, &mut map)
            .unwrap();

        add(&store, "urn:a", AGE, Node::typed_literal("7", xsd::INTEGER));
        let refreshed = GraphLoader::new(&store, &reg, &vocab, LoadConfig::default())
            .reload(&mut graph, &[Node::uri("urn:a"), Node::uri("urn:unmapped")], &mut map)
            .unwrap();
        assert_eq!(refreshed, vec![a]);
        assert_eq!(graph.property(a, "age"), Some(&Variant::Int(7)));

        store
            .remove(&Triple::new(Node::uri("urn:a"), Node::Nothing, Node::Nothing))
            .unwrap();
        GraphLoader::new(&store, &reg, &vocab, LoadConfig::default())
            .reload(&mut graph, &[Node::uri("urn:a")], &mut map)
            .unwrap();
        assert!(!graph.contains(a));
        assert!(map.is_empty());
    }

    #[test]
    fn load_all_skips_failures() {
        let store = InMemoryTripleStore::new();
        person(&store, "urn:a");
        person(&store, "urn:b");
        add(&store, "urn:c", rdf::TYPE, Node::uri("urn:unknown#Type"));
        let reg = registry();
        let vocab = Vocabulary::default();
        let mut graph = ObjectGraph::new();
        let mut map = ObjectMap::new();
        let mut loader = GraphLoader::new(&store, &reg, &vocab, LoadConfig::default());
        let loaded = loader.load_all(&mut graph, &mut map).unwrap();
        assert_eq!(loaded.len(), 2);

        let mut graph = ObjectGraph::new();
        let mut map = ObjectMap::new();
        let people = GraphLoader::new(&store, &reg, &vocab, LoadConfig::default())
            .load_type(&mut graph, &Node::uri("urn:tether:class#Person"), &mut map)
            .unwrap();
        assert_eq!(people.len(), 2);
    }
}
