#![allow(dead_code)]

use std::collections::BTreeMap;

use tether_mapper::{NodeMap, ObjectMap};
use tether_object::{
    ContainerBinding, ElementType, Handle, ObjectGraph, PropertyDescriptor, ScalarType,
    TypeDescriptor, TypeRegistry, Variant,
};
use tether_types::Node;

pub const PERSON_CLASS: &str = "urn:tether:class#Person";

pub fn prop(name: &str) -> Node {
    Node::uri(format!("urn:tether:property#{name}"))
}

/// People with scalar, object, sequence and set properties, plus folders
/// owning items.
pub fn registry() -> TypeRegistry {
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
            .property(PropertyDescriptor::scalar("height", ScalarType::Double))
            .property(PropertyDescriptor::scalar("active", ScalarType::Bool))
            .property(PropertyDescriptor::object("friend", "Person"))
            .property(PropertyDescriptor::container("colours", "Strings"))
            .property(PropertyDescriptor::container("knows", "People")),
    );
    reg.register(
        TypeDescriptor::new("Folder")
            .property(PropertyDescriptor::scalar("title", ScalarType::String)),
    );
    reg.register(
        TypeDescriptor::new("Item")
            .with_parent()
            .property(PropertyDescriptor::scalar("label", ScalarType::String)),
    );
    reg
}

pub fn person(graph: &mut ObjectGraph, reg: &TypeRegistry, uri: Option<&str>, name: &str) -> Handle {
    let p = reg.build("Person", graph, None).unwrap();
    if let Some(uri) = uri {
        reg.set_property(graph, p, "uri", Variant::Uri(uri.into())).unwrap();
    }
    reg.set_property(graph, p, "name", Variant::from(name)).unwrap();
    p
}

pub fn colours(values: &[&str]) -> Variant {
    Variant::List(values.iter().map(|v| Variant::from(*v)).collect())
}

/// Graph-independent rendering of an object and its subtree: handles are
/// replaced by the nodes they map to, set members are sorted.
#[derive(Debug, PartialEq)]
pub struct Shape {
    pub type_name: String,
    pub properties: BTreeMap<String, Variant>,
    pub children: Vec<Shape>,
}

pub fn shape(graph: &ObjectGraph, object: Handle, nodes: &NodeMap) -> Shape {
    let o = graph.get(object).unwrap();
    let properties = o
        .properties()
        .iter()
        .map(|(name, value)| {
            let mut value = resolve(value, nodes);
            if name == "knows" {
                if let Variant::List(items) = &mut value {
                    items.sort_by_key(|v| format!("{v:?}"));
                }
            }
            (name.clone(), value)
        })
        .collect();
    Shape {
        type_name: o.type_name().to_string(),
        properties,
        children: o
            .children()
            .iter()
            .map(|c| shape(graph, *c, nodes))
            .collect(),
    }
}

fn resolve(value: &Variant, nodes: &NodeMap) -> Variant {
    match value {
        Variant::Object(h) => Variant::Reference(nodes[h].clone()),
        Variant::List(items) => Variant::List(items.iter().map(|v| resolve(v, nodes)).collect()),
        other => other.clone(),
    }
}

pub fn invert(objects: &ObjectMap) -> NodeMap {
    objects.iter().map(|(n, o)| (*o, n.clone())).collect()
}
