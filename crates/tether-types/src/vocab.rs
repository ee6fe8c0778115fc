//! Vocabulary constants.
//!
//! - `rdf` - RDF vocabulary (http://www.w3.org/1999/02/22-rdf-syntax-ns#)
//! - `rdfs` - RDFS vocabulary (http://www.w3.org/2000/01/rdf-schema#)
//! - `xsd` - XSD vocabulary (http://www.w3.org/2001/XMLSchema#)
//! - `tether` - private datatypes and default prefixes

/// RDF vocabulary constants
pub mod rdf {
    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

    /// rdf:type IRI
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

    /// rdf:first IRI (RDF list head)
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";

    /// rdf:rest IRI (RDF list tail)
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";

    /// rdf:nil IRI (RDF list terminator)
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
}

/// RDFS vocabulary constants
pub mod rdfs {
    pub const NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";
}

/// XSD vocabulary constants
pub mod xsd {
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const DURATION: &str = "http://www.w3.org/2001/XMLSchema#duration";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    pub const TIME: &str = "http://www.w3.org/2001/XMLSchema#time";
}

/// Tether's own namespace: private datatypes and default mapping prefixes.
pub mod tether {
    pub const NAMESPACE: &str = "urn:tether:";

    /// Datatype of literals carrying an opaque, Tether-only variant encoding.
    pub const ENCODED_VARIANT: &str = "urn:tether:datatype#encodedVariant";

    /// Default prefix for property predicates.
    pub const PROPERTY_PREFIX: &str = "urn:tether:property#";

    /// Default prefix for the `parent` and `follows` relationship predicates.
    pub const RELATIONSHIP_PREFIX: &str = "urn:tether:relationship#";

    /// Default prefix for class (rdf:type) URIs.
    pub const CLASS_PREFIX: &str = "urn:tether:class#";

    /// Default prefix for synthesized instance URIs.
    pub const INSTANCE_PREFIX: &str = "urn:tether:instance:";

    /// Local name of the parent-link predicate.
    pub const PARENT: &str = "parent";

    /// Local name of the previous-sibling predicate.
    pub const FOLLOWS: &str = "follows";
}
