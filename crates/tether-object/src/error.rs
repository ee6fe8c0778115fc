use crate::graph::Handle;

/// Errors from object graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    /// The handle refers to a freed (or never allocated) slot.
    #[error("dead object handle {0}")]
    DeadHandle(Handle),

    /// Re-parenting would make an object its own ancestor.
    #[error("cannot make {parent} the parent of its ancestor {child}")]
    CyclicParent { child: Handle, parent: Handle },
}

/// Result alias for object graph operations.
pub type ObjectResult<T> = Result<T, ObjectError>;

/// Errors from type registry lookups, construction and property access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("construction failed for type {0}")]
    ConstructionFailed(String),

    #[error("type {type_name} has no property {property}")]
    UnknownProperty { type_name: String, property: String },

    #[error("property {type_name}.{property} is read-only")]
    ReadOnly { type_name: String, property: String },

    #[error("property {type_name}.{property} expects {expected}, got {found}")]
    TypeMismatch {
        type_name: String,
        property: String,
        expected: String,
        found: String,
    },

    #[error("property {property} rejected value: {reason}")]
    Rejected { property: String, reason: String },

    #[error("graph error: {0}")]
    Graph(#[from] ObjectError),
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors from converting between variants and nodes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The value has no node form (null, or an in-memory object handle).
    #[error("value cannot be encoded as a node: {0}")]
    NotEncodable(String),

    /// A literal's lexical form does not parse for its datatype.
    #[error("invalid lexical form {value:?} for {datatype}")]
    InvalidLexical { value: String, datatype: String },

    /// The opaque variant encoding could not be produced or read back.
    #[error("opaque encoding error: {0}")]
    Opaque(String),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
