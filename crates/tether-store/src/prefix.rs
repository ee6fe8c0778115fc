//! Prefix table for short-name expansion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tether_types::vocab::{rdf, rdfs, tether, xsd};
use tether_types::{Node, Triple};

/// Maps short prefixes (`rdf`, `xsd`, ...) to namespace URIs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixMap {
    prefixes: BTreeMap<String, String>,
}

impl PrefixMap {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }

    /// Register (or replace) a prefix.
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// Expand `prefix:local` if `prefix` is registered.
    pub fn expand(&self, name: &str) -> String {
        if let Some((prefix, local)) = name.split_once(':') {
            if !local.starts_with("//") {
                if let Some(ns) = self.prefixes.get(prefix) {
                    return format!("{ns}{local}");
                }
            }
        }
        name.to_string()
    }

    /// Expand the URI (or literal datatype) carried by a node.
    pub fn expand_node(&self, node: &Node) -> Node {
        match node {
            Node::Uri(uri) => Node::Uri(self.expand(uri)),
            Node::Literal {
                value,
                datatype: Some(dt),
            } => Node::typed_literal(value.clone(), self.expand(dt)),
            other => other.clone(),
        }
    }

    pub fn expand_triple(&self, triple: &Triple) -> Triple {
        Triple::new(
            self.expand_node(&triple.subject),
            self.expand_node(&triple.predicate),
            self.expand_node(&triple.object),
        )
    }
}

impl Default for PrefixMap {
    fn default() -> Self {
        let mut map = Self::empty();
        map.insert("rdf", rdf::NAMESPACE);
        map.insert("rdfs", rdfs::NAMESPACE);
        map.insert("xsd", xsd::NAMESPACE);
        map.insert("tether", tether::NAMESPACE);
        map
    }
}
