use crate::types::{Element, ElementKind, Relation, SymbolGraph};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

impl SymbolGraph {
    /// Direct super types of a class (outgoing SuperType edges)
    pub fn super_types(&self, class: NodeIndex) -> Vec<NodeIndex> {
        self.targets(class, |relation| matches!(relation, Relation::SuperType))
    }

    /// Direct subclasses of a class (outgoing SubType edges)
    pub fn sub_types(&self, class: NodeIndex) -> Vec<NodeIndex> {
        self.targets(class, |relation| matches!(relation, Relation::SubType))
    }

    /// Elements owned by a package
    pub fn owned_elements(&self, package: NodeIndex) -> Vec<NodeIndex> {
        self.targets(package, |relation| matches!(relation, Relation::Owns))
    }

    /// Package that owns an element; `None` for the root
    pub fn owner(&self, element: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(element, Direction::Incoming)
            .find(|edge| matches!(edge.weight(), Relation::Owns))
            .map(|edge| edge.source())
    }

    pub fn has_relation(&self, from: NodeIndex, to: NodeIndex, relation: &Relation) -> bool {
        self.graph
            .edges_connecting(from, to)
            .any(|edge| edge.weight() == relation)
    }

    /// Adds the edge unless an identical one already exists.
    pub fn ensure_relation(&mut self, from: NodeIndex, to: NodeIndex, relation: Relation) -> bool {
        if self.has_relation(from, to, &relation) {
            return false;
        }
        self.add_edge(from, to, relation);
        true
    }

    /// All classes, in insertion order
    pub fn classes(&self) -> impl Iterator<Item = (NodeIndex, &Element)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.get(idx).map(|element| (idx, element)))
            .filter(|(_, element)| matches!(element.kind, ElementKind::Class(_)))
    }

    fn targets(&self, from: NodeIndex, keep: impl Fn(&Relation) -> bool) -> Vec<NodeIndex> {
        let mut targets: Vec<NodeIndex> = self
            .graph
            .edges(from)
            .filter(|edge| keep(edge.weight()))
            .map(|edge| edge.target())
            .collect();
        // petgraph walks edges newest first
        targets.reverse();
        targets
    }
}
