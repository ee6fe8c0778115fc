use std::fmt;

use serde::{Deserialize, Serialize};

/// A single RDF term.
///
/// `Nothing` is a wildcard used in match patterns and is never persisted.
/// Equality is structural: two literals are equal only when both their
/// lexical value and their datatype agree, so `"42"` and
/// `"42"^^xsd:integer` are different nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Node {
    /// Wildcard; matches any node in a pattern.
    #[default]
    Nothing,
    /// A named resource.
    Uri(String),
    /// An anonymous resource, identified only within one store.
    Blank(String),
    /// A literal value with an optional datatype URI.
    Literal {
        value: String,
        datatype: Option<String>,
    },
}

impl Node {
    /// Create a Uri node.
    pub fn uri(uri: impl Into<String>) -> Self {
        Node::Uri(uri.into())
    }

    /// Create a blank node from its label (without the `_:` prefix).
    pub fn blank(label: impl Into<String>) -> Self {
        Node::Blank(label.into())
    }

    /// Create an untyped (plain) literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            datatype: None,
        }
    }

    /// Create a literal tagged with a datatype URI.
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Node::Nothing)
    }

    pub fn is_uri(&self) -> bool {
        matches!(self, Node::Uri(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal { .. })
    }

    /// Returns `true` for Uri and blank nodes, the only valid subjects.
    pub fn is_resource(&self) -> bool {
        matches!(self, Node::Uri(_) | Node::Blank(_))
    }

    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Node::Uri(uri) => Some(uri),
            _ => None,
        }
    }

    pub fn as_blank(&self) -> Option<&str> {
        match self {
            Node::Blank(label) => Some(label),
            _ => None,
        }
    }

    /// Lexical value of a literal.
    pub fn literal_value(&self) -> Option<&str> {
        match self {
            Node::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Datatype URI of a typed literal.
    pub fn datatype(&self) -> Option<&str> {
        match self {
            Node::Literal { datatype, .. } => datatype.as_deref(),
            _ => None,
        }
    }

    /// Whether this node, used as a pattern position, accepts `other`.
    pub fn accepts(&self, other: &Node) -> bool {
        self.is_nothing() || self == other
    }

    /// N-Triples rendering of this term. `Nothing` renders as `*`.
    pub fn to_ntriples(&self) -> String {
        match self {
            Node::Nothing => "*".to_string(),
            Node::Uri(uri) => format!("<{uri}>"),
            Node::Blank(label) => format!("_:{label}"),
            Node::Literal { value, datatype } => {
                let escaped = escape_literal(value);
                match datatype {
                    Some(dt) => format!("\"{escaped}\"^^<{dt}>"),
                    None => format!("\"{escaped}\""),
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ntriples())
    }
}

impl From<&str> for Node {
    fn from(uri: &str) -> Self {
        Node::Uri(uri.to_string())
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
