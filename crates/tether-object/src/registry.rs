//! Explicit per-type descriptor tables.
//!
//! A [`TypeRegistry`] is built once by the host application and passed by
//! reference to whatever needs to construct objects or enumerate their
//! properties. Nothing here is global.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ObjectError, RegistryError, RegistryResult};
use crate::graph::{Handle, ObjectGraph};
use crate::variant::{ScalarType, Variant};

/// How a container's element order is treated when persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Ordered, duplicates allowed.
    Sequence,
    /// Unordered, no duplicates.
    Set,
}

/// Element type of a container binding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Scalar(ScalarType),
    /// Handles to objects of the named type.
    Object(String),
}

/// Binds a container type name to its kind and element type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerBinding {
    pub kind: ContainerKind,
    pub element: ElementType,
}

impl ContainerBinding {
    pub fn sequence(element: ElementType) -> Self {
        Self {
            kind: ContainerKind::Sequence,
            element,
        }
    }

    pub fn set(element: ElementType) -> Self {
        Self {
            kind: ContainerKind::Set,
            element,
        }
    }
}

/// Declared type of a property value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Scalar(ScalarType),
    /// A handle to an object of the named type.
    Object(String),
    /// A value of the named registered container type.
    Container(String),
}

/// Validating transform applied on every checked property write. Returns
/// the value to store, or a rejection reason.
pub type Setter = Arc<dyn Fn(&Variant) -> Result<Variant, String> + Send + Sync>;

/// Whether a type's constructor takes the owning parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    Nullary,
    WithParent,
}

/// Post-construction hook. Returning `false` aborts construction.
pub type Initializer = Arc<dyn Fn(&mut ObjectGraph, Handle) -> bool + Send + Sync>;

/// One named property of a registered type.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    value_type: ValueType,
    default: Variant,
    stored: bool,
    readable: bool,
    writable: bool,
    identity: bool,
    setter: Option<Setter>,
}

impl PropertyDescriptor {
    fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            default: Variant::Null,
            stored: true,
            readable: true,
            writable: true,
            identity: false,
            setter: None,
        }
    }

    pub fn scalar(name: &str, scalar: ScalarType) -> Self {
        Self::new(name, ValueType::Scalar(scalar))
    }

    pub fn object(name: &str, type_name: &str) -> Self {
        Self::new(name, ValueType::Object(type_name.to_string()))
    }

    pub fn container(name: &str, container: &str) -> Self {
        Self::new(name, ValueType::Container(container.to_string()))
    }

    /// A Uri-valued property holding the object's persisted identity. The
    /// identity is the subject of the object's triples, so it is not stored
    /// as a property triple of its own.
    pub fn identity(name: &str) -> Self {
        let mut desc = Self::new(name, ValueType::Scalar(ScalarType::Uri));
        desc.identity = true;
        desc.stored = false;
        desc
    }

    pub fn with_default(mut self, value: impl Into<Variant>) -> Self {
        self.default = value.into();
        self
    }

    pub fn not_stored(mut self) -> Self {
        self.stored = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    pub fn with_setter(
        mut self,
        setter: impl Fn(&Variant) -> Result<Variant, String> + Send + Sync + 'static,
    ) -> Self {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn default_value(&self) -> &Variant {
        &self.default
    }

    pub fn is_stored(&self) -> bool {
        self.stored
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Stored, readable and writable: the properties a store/load pass
    /// round-trips.
    pub fn is_persistent(&self) -> bool {
        self.stored && self.readable && self.writable
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("stored", &self.stored)
            .field("identity", &self.identity)
            .finish()
    }
}

/// A registered type: constructor shape, class URI and property table.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    class_uri: Option<String>,
    arity: Arity,
    properties: Vec<PropertyDescriptor>,
    init: Option<Initializer>,
}

impl TypeDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            class_uri: None,
            arity: Arity::Nullary,
            properties: Vec::new(),
            init: None,
        }
    }

    /// Require an owning parent at construction.
    pub fn with_parent(mut self) -> Self {
        self.arity = Arity::WithParent;
        self
    }

    /// Map the type to an explicit class URI instead of the vocabulary's
    /// class prefix plus type name.
    pub fn with_class_uri(mut self, uri: &str) -> Self {
        self.class_uri = Some(uri.to_string());
        self
    }

    /// Add or replace a property.
    pub fn property(mut self, desc: PropertyDescriptor) -> Self {
        self.properties.retain(|p| p.name != desc.name);
        self.properties.push(desc);
        self
    }

    pub fn with_init(
        mut self,
        init: impl Fn(&mut ObjectGraph, Handle) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.init = Some(Arc::new(init));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn explicit_class_uri(&self) -> Option<&str> {
        self.class_uri.as_deref()
    }

    /// The class URI under `class_prefix`, unless overridden.
    pub fn class_uri(&self, class_prefix: &str) -> String {
        match &self.class_uri {
            Some(uri) => uri.clone(),
            None => format!("{class_prefix}{}", self.name),
        }
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn identity_property(&self) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.identity)
    }

    pub fn persistent_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.is_persistent())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("properties", &self.properties.len())
            .finish()
    }
}

/// Registry of object types and container bindings, keyed by stable names.
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
    containers: HashMap<String, ContainerBinding>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------

    /// Register a type, replacing any previous entry with the same name.
    pub fn register(&mut self, desc: TypeDescriptor) {
        debug!(type_name = %desc.name, properties = desc.properties.len(), "registered type");
        self.types.insert(desc.name.clone(), desc);
    }

    pub fn knows(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> RegistryResult<&TypeDescriptor> {
        self.types
            .get(name)
            .ok_or_else(|| RegistryError::UnknownType(name.to_string()))
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a class URI to a registered type name. Explicit class URIs win
    /// over names derived from `class_prefix`.
    pub fn type_for_class_uri(&self, uri: &str, class_prefix: &str) -> Option<&str> {
        if let Some(desc) = self
            .types
            .values()
            .find(|d| d.class_uri.as_deref() == Some(uri))
        {
            return Some(&desc.name);
        }
        let local = uri.strip_prefix(class_prefix)?;
        self.types
            .get(local)
            .filter(|d| d.class_uri.is_none())
            .map(|d| d.name.as_str())
    }

    /// Construct an object of a registered type with its declared defaults.
    ///
    /// A [`Arity::WithParent`] type fails without a parent. An initializer
    /// returning `false` destroys the half-built object and fails.
    pub fn build(
        &self,
        name: &str,
        graph: &mut ObjectGraph,
        parent: Option<Handle>,
    ) -> RegistryResult<Handle> {
        let desc = self.descriptor(name)?;
        if desc.arity == Arity::WithParent && parent.is_none() {
            return Err(RegistryError::ConstructionFailed(format!(
                "{name} requires a parent"
            )));
        }
        let handle = graph.create(name, parent)?;
        for prop in &desc.properties {
            graph.set_property_quiet(handle, &prop.name, prop.default.clone())?;
        }
        if let Some(init) = &desc.init {
            if !init(graph, handle) {
                graph.destroy(handle)?;
                return Err(RegistryError::ConstructionFailed(name.to_string()));
            }
        }
        debug!(type_name = name, object = %handle, "built object");
        Ok(handle)
    }

    /// Property values of a freshly default-constructed instance.
    ///
    /// Builds the instance in a scratch graph, so initializers run.
    pub fn default_values(&self, name: &str) -> RegistryResult<BTreeMap<String, Variant>> {
        let desc = self.descriptor(name)?;
        let mut scratch = ObjectGraph::new();
        let parent = match desc.arity {
            Arity::WithParent => Some(scratch.create("", None)?),
            Arity::Nullary => None,
        };
        let handle = self.build(name, &mut scratch, parent)?;
        Ok(scratch
            .get(handle)
            .map(|o| o.properties().clone())
            .unwrap_or_default())
    }

    // ---------------------------------------------------------------
    // Checked property access
    // ---------------------------------------------------------------

    fn property_of(
        &self,
        graph: &ObjectGraph,
        handle: Handle,
        property: &str,
    ) -> RegistryResult<&PropertyDescriptor> {
        let object = graph
            .get(handle)
            .ok_or(ObjectError::DeadHandle(handle))?;
        let desc = self.descriptor(object.type_name())?;
        desc.find_property(property)
            .ok_or_else(|| RegistryError::UnknownProperty {
                type_name: desc.name.clone(),
                property: property.to_string(),
            })
    }

    /// Read a declared property, falling back to its default.
    pub fn get_property(
        &self,
        graph: &ObjectGraph,
        handle: Handle,
        property: &str,
    ) -> RegistryResult<Variant> {
        let desc = self.property_of(graph, handle, property)?;
        Ok(graph
            .property(handle, property)
            .cloned()
            .unwrap_or_else(|| desc.default.clone()))
    }

    /// Assign a declared property through its type check and setter. The
    /// write is journaled if the object is observed.
    pub fn set_property(
        &self,
        graph: &mut ObjectGraph,
        handle: Handle,
        property: &str,
        value: Variant,
    ) -> RegistryResult<()> {
        let type_name = graph
            .get(handle)
            .map(|o| o.type_name().to_string())
            .unwrap_or_default();
        let desc = self.property_of(graph, handle, property)?;
        if !desc.writable {
            return Err(RegistryError::ReadOnly {
                type_name,
                property: property.to_string(),
            });
        }
        let value = self.coerce(graph, &desc.value_type, value).map_err(|found| {
            RegistryError::TypeMismatch {
                type_name: type_name.clone(),
                property: property.to_string(),
                expected: format!("{:?}", desc.value_type),
                found,
            }
        })?;
        let value = match &desc.setter {
            Some(setter) => setter(&value).map_err(|reason| RegistryError::Rejected {
                property: property.to_string(),
                reason,
            })?,
            None => value,
        };
        graph.set_property(handle, property, value)?;
        Ok(())
    }

    /// Check `value` against a declared type, widening ints to doubles.
    /// On mismatch returns the offending kind name.
    fn coerce(
        &self,
        graph: &ObjectGraph,
        value_type: &ValueType,
        value: Variant,
    ) -> Result<Variant, String> {
        match (value_type, value) {
            (_, Variant::Null) => Ok(Variant::Null),
            (ValueType::Scalar(ScalarType::Double), Variant::Int(i)) => Ok(Variant::Double(i as f64)),
            (ValueType::Scalar(scalar), value) if value.fits_scalar(*scalar) => Ok(value),
            (ValueType::Object(_), Variant::Reference(node)) => Ok(Variant::Reference(node)),
            (ValueType::Object(type_name), value) if self.can_extract(graph, type_name, &value) => {
                Ok(value)
            }
            (ValueType::Container(container), Variant::List(items)) => {
                let binding = self.container(container).map_err(|e| e.to_string())?;
                items
                    .into_iter()
                    .map(|item| match &binding.element {
                        ElementType::Scalar(s) => {
                            self.coerce(graph, &ValueType::Scalar(*s), item)
                        }
                        ElementType::Object(t) => {
                            self.coerce(graph, &ValueType::Object(t.clone()), item)
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Variant::List)
            }
            (_, value) => Err(value.kind_name().to_string()),
        }
    }

    // ---------------------------------------------------------------
    // Pointer-valued properties
    // ---------------------------------------------------------------

    /// Whether `value` is a live handle to an object of `type_name`.
    pub fn can_extract(&self, graph: &ObjectGraph, type_name: &str, value: &Variant) -> bool {
        self.extract(graph, type_name, value).is_some()
    }

    /// The object a pointer-valued property refers to.
    pub fn extract(&self, graph: &ObjectGraph, type_name: &str, value: &Variant) -> Option<Handle> {
        let handle = value.as_object()?;
        let object = graph.get(handle)?;
        (self.knows(type_name) && object.type_name() == type_name).then_some(handle)
    }

    pub fn can_inject(&self, graph: &ObjectGraph, type_name: &str, handle: Handle) -> bool {
        self.knows(type_name)
            && graph
                .get(handle)
                .is_some_and(|o| o.type_name() == type_name)
    }

    /// Wrap an object as a pointer-valued property value.
    pub fn inject(
        &self,
        graph: &ObjectGraph,
        type_name: &str,
        handle: Handle,
    ) -> RegistryResult<Variant> {
        if self.can_inject(graph, type_name, handle) {
            Ok(Variant::Object(handle))
        } else {
            Err(RegistryError::TypeMismatch {
                type_name: type_name.to_string(),
                property: String::new(),
                expected: type_name.to_string(),
                found: graph
                    .get(handle)
                    .map(|o| o.type_name().to_string())
                    .unwrap_or_else(|| "dead handle".to_string()),
            })
        }
    }

    // ---------------------------------------------------------------
    // Containers
    // ---------------------------------------------------------------

    /// Bind a container type name, replacing any previous binding.
    pub fn register_container(&mut self, name: &str, binding: ContainerBinding) {
        debug!(container = name, kind = ?binding.kind, "registered container");
        self.containers.insert(name.to_string(), binding);
    }

    pub fn container(&self, name: &str) -> RegistryResult<&ContainerBinding> {
        self.containers
            .get(name)
            .ok_or_else(|| RegistryError::UnknownType(name.to_string()))
    }

    pub fn can_extract_container(&self, name: &str, value: &Variant) -> bool {
        self.containers.contains_key(name) && matches!(value, Variant::List(_) | Variant::Null)
    }

    /// Elements of a container value, in order. Sets drop repeated members.
    pub fn extract_container(&self, name: &str, value: &Variant) -> RegistryResult<Vec<Variant>> {
        let binding = self.container(name)?;
        let items = match value {
            Variant::Null => Vec::new(),
            Variant::List(items) => items.clone(),
            other => {
                return Err(RegistryError::TypeMismatch {
                    type_name: name.to_string(),
                    property: String::new(),
                    expected: "list".to_string(),
                    found: other.kind_name().to_string(),
                })
            }
        };
        Ok(match binding.kind {
            ContainerKind::Sequence => items,
            ContainerKind::Set => dedup(items),
        })
    }

    pub fn can_inject_container(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    /// Build a container value from its elements.
    pub fn inject_container(&self, name: &str, items: Vec<Variant>) -> RegistryResult<Variant> {
        let binding = self.container(name)?;
        Ok(Variant::List(match binding.kind {
            ContainerKind::Sequence => items,
            ContainerKind::Set => dedup(items),
        }))
    }
}

fn dedup(items: Vec<Variant>) -> Vec<Variant> {
    let mut unique: Vec<Variant> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .field("containers", &self.containers.len())
            .finish()
    }
}
