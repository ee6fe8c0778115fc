//! Object side of Tether.
//!
//! Everything the mapper needs to know about the in-memory graph lives here,
//! independent of any triple store:
//!
//! - [`Variant`] -- closed tagged union of property values
//! - [`ObjectGraph`] -- arena of objects addressed by generation-checked
//!   [`Handle`]s; parent/child edges are owning, everything else is a plain
//!   handle, and a handle to a freed slot is detectable rather than dangling
//! - [`TypeRegistry`] -- per-type property descriptor tables, constructors,
//!   and pointer/container bindings, built once by the host application
//! - [`codec`] -- the deterministic mapping between scalar variants and
//!   literal/URI nodes

pub mod codec;
pub mod error;
pub mod graph;
pub mod registry;
pub mod variant;

pub use codec::{from_variant, node_equal, to_variant};
pub use error::{CodecError, CodecResult, ObjectError, ObjectResult, RegistryError, RegistryResult};
pub use graph::{GraphEvent, Handle, Object, ObjectGraph};
pub use registry::{
    Arity, ContainerBinding, ContainerKind, ElementType, Initializer, PropertyDescriptor, Setter,
    TypeDescriptor, TypeRegistry, ValueType,
};
pub use variant::{ScalarType, Variant};
