use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};
use tether_types::vocab::tether;
use tether_types::Node;

/// Which related objects a store or load pass traverses into.
///
/// Serialized as a list of flag names.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<FollowFlag>", from = "Vec<FollowFlag>")]
pub struct FollowPolicy(u8);

impl FollowPolicy {
    pub const NONE: Self = Self(0);
    pub const OBJECT_PROPERTIES: Self = Self(1);
    pub const PARENT: Self = Self(1 << 1);
    pub const SIBLINGS: Self = Self(1 << 2);
    pub const CHILDREN: Self = Self(1 << 3);
    pub const ALL: Self = Self(0b1111);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FollowPolicy {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FollowPolicy {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FollowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(Vec::<FollowFlag>::from(*self)).finish()
    }
}

/// Named bit of a [`FollowPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowFlag {
    ObjectProperties,
    Parent,
    Siblings,
    Children,
}

impl FollowFlag {
    const ALL: [FollowFlag; 4] = [
        FollowFlag::ObjectProperties,
        FollowFlag::Parent,
        FollowFlag::Siblings,
        FollowFlag::Children,
    ];

    fn policy(self) -> FollowPolicy {
        match self {
            FollowFlag::ObjectProperties => FollowPolicy::OBJECT_PROPERTIES,
            FollowFlag::Parent => FollowPolicy::PARENT,
            FollowFlag::Siblings => FollowPolicy::SIBLINGS,
            FollowFlag::Children => FollowPolicy::CHILDREN,
        }
    }
}

impl From<FollowPolicy> for Vec<FollowFlag> {
    fn from(policy: FollowPolicy) -> Self {
        FollowFlag::ALL
            .into_iter()
            .filter(|flag| policy.contains(flag.policy()))
            .collect()
    }
}

impl From<Vec<FollowFlag>> for FollowPolicy {
    fn from(flags: Vec<FollowFlag>) -> Self {
        flags
            .into_iter()
            .fold(FollowPolicy::NONE, |acc, flag| acc | flag.policy())
    }
}

/// Which properties the storer writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStorePolicy {
    /// Every stored, readable property.
    #[default]
    Always,
    /// Only properties whose encoded value differs from a freshly
    /// default-constructed instance of the same type.
    IfChanged,
}

/// Whether objects without a Uri may be stored as anonymous nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankNodePolicy {
    /// Synthesize a unique Uri for every object lacking one.
    NoBlankNodes,
    /// Use an anonymous node for objects without a Uri.
    #[default]
    AsNeeded,
}

/// What the loader does with a property that has no matching triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentPropertyPolicy {
    /// Leave the property untouched.
    #[default]
    Ignore,
    /// Assign the default-constructed value.
    Reset,
}

/// Prefixes of every URI the mapper mints or recognizes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Prefix of property predicates: `<prefix><property name>`.
    pub property_prefix: String,
    /// Prefix of the parent and follows predicates.
    pub relationship_prefix: String,
    /// Prefix of class URIs for types without an explicit class URI.
    pub class_prefix: String,
    /// Prefix of synthesized instance URIs: `<prefix><type name>/<n>`.
    pub instance_prefix: String,
    /// Name of the property holding an object's persisted Uri, used for
    /// types that do not flag an identity property themselves.
    pub identity_property: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            property_prefix: tether::PROPERTY_PREFIX.to_string(),
            relationship_prefix: tether::RELATIONSHIP_PREFIX.to_string(),
            class_prefix: tether::CLASS_PREFIX.to_string(),
            instance_prefix: tether::INSTANCE_PREFIX.to_string(),
            identity_property: "uri".to_string(),
        }
    }
}

impl Vocabulary {
    pub fn property(&self, name: &str) -> Node {
        Node::uri(format!("{}{name}", self.property_prefix))
    }

    pub fn parent(&self) -> Node {
        Node::uri(format!("{}{}", self.relationship_prefix, tether::PARENT))
    }

    pub fn follows(&self) -> Node {
        Node::uri(format!("{}{}", self.relationship_prefix, tether::FOLLOWS))
    }

    pub fn instance_prefix_for(&self, type_name: &str) -> String {
        format!("{}{type_name}/", self.instance_prefix)
    }
}

/// Graph storer settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub properties: PropertyStorePolicy,
    pub blank_nodes: BlankNodePolicy,
    pub follow: FollowPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            properties: PropertyStorePolicy::Always,
            blank_nodes: BlankNodePolicy::AsNeeded,
            follow: FollowPolicy::OBJECT_PROPERTIES | FollowPolicy::CHILDREN,
        }
    }
}

/// Graph loader settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub absent: AbsentPropertyPolicy,
    pub follow: FollowPolicy,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            absent: AbsentPropertyPolicy::Ignore,
            follow: FollowPolicy::OBJECT_PROPERTIES | FollowPolicy::CHILDREN,
        }
    }
}

/// Everything an [`ObjectMapper`](crate::ObjectMapper) session needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub vocabulary: Vocabulary,
    pub store: StoreConfig,
    pub load: LoadConfig,
}
