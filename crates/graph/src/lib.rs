//! # Pure IDE Graph
//!
//! Rebuilds a typed model graph from the flattened diagram payloads the server
//! returns, so a diagram can be rendered, extended class by class, and written
//! back to its grammar.
//!
//! ## Architecture
//!
//! ```text
//! DiagramInfo (wire records)
//!     │
//!     ├──> Pass 1: register classes, profiles, enumerations (non-stub)
//!     ├──> Pass 2: attach stereotypes, tagged values, super types, properties
//!     │      └─ unknown referenced types become stubs, resolved in place later
//!     └──> Pass 3: type views, property views, generalization views
//!     │
//!     ▼
//! (Diagram, SymbolGraph (petgraph), StubMetadata)
//!     │
//!     ├──> add_class_to_graph  (incremental, resolves stubs)
//!     └──> serialize_diagram   (diagram grammar text)
//! ```

mod diagram;
mod error;
mod graph;
mod reconstructor;
mod serializer;
mod types;

pub use diagram::{ClassView, Diagram, GeneralizationView, Point, PropertyView, Rectangle, RelationshipView};
pub use error::{GraphError, Result};
pub use reconstructor::{add_class_to_graph, build, ClassMetadata, StubMetadata};
pub use serializer::serialize_diagram;
pub use types::{
    ClassNode, Element, ElementKind, Multiplicity, ProfileNode, Property, Relation, StereotypeRef,
    SymbolGraph, TaggedValue, TypeRef,
};
