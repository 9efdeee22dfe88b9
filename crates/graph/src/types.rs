use crate::error::{GraphError, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use pure_ide_protocol::{join_element_path, ELEMENT_PATH_DELIMITER};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// `[lower..upper]` bounds of a property; `upper = None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Multiplicity {
    pub lower: u32,
    pub upper: Option<u32>,
}

impl Multiplicity {
    pub const ONE: Self = Self {
        lower: 1,
        upper: Some(1),
    };
    pub const MANY: Self = Self {
        lower: 0,
        upper: None,
    };

    /// Parses `*`, `n`, `n..m` and `n..*`.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || GraphError::InvalidMultiplicity(text.to_string());
        let bound = |part: &str| part.trim().parse::<u32>().map_err(|_| invalid());

        let text = text.trim();
        if text == "*" {
            return Ok(Self::MANY);
        }
        let parts: Vec<&str> = text.split("..").collect();
        match parts.as_slice() {
            [single] => {
                let value = bound(*single)?;
                Ok(Self {
                    lower: value,
                    upper: Some(value),
                })
            }
            [lower, upper] => {
                let lower = bound(*lower)?;
                let upper = match upper.trim() {
                    "*" => None,
                    value => Some(bound(value)?),
                };
                if upper.is_some_and(|upper| upper < lower) {
                    return Err(invalid());
                }
                Ok(Self { lower, upper })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            None if self.lower == 0 => write!(f, "*"),
            None => write!(f, "{}..*", self.lower),
            Some(upper) if upper == self.lower => write!(f, "{upper}"),
            Some(upper) => write!(f, "{}..{upper}", self.lower),
        }
    }
}

/// What a property's generic type resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Class(NodeIndex),
    Enumeration(NodeIndex),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub multiplicity: Multiplicity,
    pub type_path: String,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StereotypeRef {
    pub profile: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedValue {
    pub profile: String,
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNode {
    pub properties: Vec<Property>,
    /// Qualified properties; rendered like properties but never navigable.
    pub derived_properties: Vec<Property>,
    pub stereotypes: Vec<StereotypeRef>,
    pub tagged_values: Vec<TaggedValue>,
}

impl ClassNode {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .chain(&self.derived_properties)
            .find(|property| property.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileNode {
    pub tags: Vec<String>,
    pub stereotypes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Package,
    Class(ClassNode),
    Enumeration { values: Vec<String> },
    Profile(ProfileNode),
    Diagram,
}

/// A packageable element addressed by its full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub path: String,
    pub kind: ElementKind,
}

impl Element {
    pub fn new(package: &str, name: &str, kind: ElementKind) -> Self {
        Self {
            name: name.to_string(),
            path: join_element_path(package, name),
            kind,
        }
    }

    pub fn as_class(&self) -> Option<&ClassNode> {
        match &self.kind {
            ElementKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_profile(&self) -> Option<&ProfileNode> {
        match &self.kind {
            ElementKind::Profile(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn is_enumeration(&self) -> bool {
        matches!(self.kind, ElementKind::Enumeration { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Package owns element.
    Owns,
    /// Subclass points at its super type.
    SuperType,
    /// Super type points at a subclass.
    SubType,
    /// Class has a property of the target type.
    PropertyType { property: String },
}

/// Package-scoped symbol table backed by a petgraph arena.
///
/// Node indices are never invalidated (nothing is removed), so they serve as
/// stable references; a class is mutated in place when a stub gets resolved.
#[derive(Debug, Clone)]
pub struct SymbolGraph {
    pub graph: DiGraph<Element, Relation>,
    /// Full path -> NodeIndex (the root package is "").
    pub path_index: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl SymbolGraph {
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(Element {
            name: String::new(),
            path: String::new(),
            kind: ElementKind::Package,
        });
        let mut path_index = HashMap::new();
        path_index.insert(String::new(), root);
        Self {
            graph,
            path_index,
            root,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn find(&self, path: &str) -> Option<NodeIndex> {
        self.path_index.get(path).copied()
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&Element> {
        self.graph.node_weight(idx)
    }

    pub fn element(&self, path: &str) -> Option<&Element> {
        self.find(path).and_then(|idx| self.get(idx))
    }

    pub fn class(&self, path: &str) -> Option<&ClassNode> {
        self.element(path).and_then(Element::as_class)
    }

    pub fn class_index(&self, path: &str) -> Option<NodeIndex> {
        self.find(path).filter(|&idx| self.get(idx).is_some_and(|e| e.as_class().is_some()))
    }

    pub fn enumeration_index(&self, path: &str) -> Option<NodeIndex> {
        self.find(path).filter(|&idx| self.get(idx).is_some_and(Element::is_enumeration))
    }

    pub fn profile(&self, path: &str) -> Option<&ProfileNode> {
        self.element(path).and_then(Element::as_profile)
    }

    pub(crate) fn class_mut(&mut self, idx: NodeIndex) -> Option<&mut ClassNode> {
        match self.graph.node_weight_mut(idx).map(|element| &mut element.kind) {
            Some(ElementKind::Class(class)) => Some(class),
            _ => None,
        }
    }

    /// Resolves `path` to a package, creating every missing segment.
    pub fn get_or_create_package(&mut self, path: &str) -> NodeIndex {
        if let Some(idx) = self.find(path) {
            return idx;
        }
        let mut parent = self.root;
        let mut current = String::new();
        for segment in path.split(ELEMENT_PATH_DELIMITER).filter(|s| !s.is_empty()) {
            let package = current.clone();
            current = join_element_path(&package, segment);
            parent = match self.find(&current) {
                Some(idx) => idx,
                None => {
                    let idx = self
                        .graph
                        .add_node(Element::new(&package, segment, ElementKind::Package));
                    self.graph.add_edge(parent, idx, Relation::Owns);
                    self.path_index.insert(current.clone(), idx);
                    idx
                }
            };
        }
        parent
    }

    /// Adds an element under `package` and indexes it by full path.
    ///
    /// Paths are unique: adding a path twice returns the existing node.
    pub fn add_element(&mut self, package: &str, name: &str, kind: ElementKind) -> NodeIndex {
        let element = Element::new(package, name, kind);
        if let Some(idx) = self.find(&element.path) {
            log::debug!("Element {} already registered", element.path);
            return idx;
        }
        let owner = self.get_or_create_package(package);
        let path = element.path.clone();
        let idx = self.graph.add_node(element);
        self.graph.add_edge(owner, idx, Relation::Owns);
        self.path_index.insert(path, idx);
        idx
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, relation: Relation) {
        self.graph.add_edge(from, to, relation);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for SymbolGraph {
    fn default() -> Self {
        Self::new()
    }
}
