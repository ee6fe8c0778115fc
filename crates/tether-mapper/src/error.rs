use tether_object::{CodecError, Handle, ObjectError, RegistryError};
use tether_store::StoreError;
use tether_txn::TxnError;
use tether_types::Node;

/// Errors from a graph load.
///
/// Per-property failures never surface here; they are logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No `rdf:type` of the node maps to a registered type, and no usable
    /// hint was supplied.
    #[error("unknown type for {node}: {}", .type_uri.as_deref().unwrap_or("no rdf:type"))]
    UnknownType { node: Node, type_uri: Option<String> },

    /// The registry knows the type but built no instance.
    #[error("construction of {type_name} for {node} failed: {reason}")]
    ConstructionFailed {
        node: Node,
        type_name: String,
        reason: String,
    },

    /// Literals and wildcards cannot be loaded as objects.
    #[error("{0} is not a resource node")]
    NotAResource(Node),

    /// A sequence head whose `rdf:first`/`rdf:rest` chain is broken or loops.
    #[error("malformed list at {0}")]
    MalformedList(Node),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("object graph error: {0}")]
    Graph(#[from] ObjectError),
}

/// Result alias for graph loads.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors from storing, removing and mapper sessions.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// The two halves of the object/node map disagree.
    #[error("object/node map inconsistency: {0}")]
    MappingInconsistency(String),

    /// `manage` needs an object that already carries its Uri.
    #[error("object {0} has no persisted Uri to manage it by")]
    MissingIdentity(Handle),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transaction error: {0}")]
    Txn(#[from] TxnError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("object graph error: {0}")]
    Graph(#[from] ObjectError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),
}

/// Result alias for storer, remover and mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;
