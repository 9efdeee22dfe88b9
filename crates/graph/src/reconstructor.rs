use crate::diagram::{ClassView, Diagram, GeneralizationView, Point, PropertyView, Rectangle, RelationshipView};
use crate::error::{GraphError, Result};
use crate::types::{
    ClassNode, ElementKind, Multiplicity, ProfileNode, Property, Relation, StereotypeRef,
    SymbolGraph, TaggedValue, TypeRef,
};
use petgraph::graph::NodeIndex;
use pure_ide_protocol::{
    split_element_path, ClassRecord, DiagramClassInfo, DiagramInfo, EnumerationRecord,
    GeometryRecord, ProfileRecord, PropertyRecord, SourceInformation,
};
use std::collections::HashMap;

/// Whether a class only exists as a placeholder for a forward reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    pub is_stubbed: bool,
    pub source_information: Option<SourceInformation>,
}

/// Class path -> stub status, kept next to the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubMetadata {
    classes: HashMap<String, ClassMetadata>,
}

impl StubMetadata {
    pub fn get(&self, path: &str) -> Option<&ClassMetadata> {
        self.classes.get(path)
    }

    pub fn is_stubbed(&self, path: &str) -> bool {
        self.get(path).is_some_and(|meta| meta.is_stubbed)
    }

    pub fn set(&mut self, path: impl Into<String>, metadata: ClassMetadata) {
        self.classes.insert(path.into(), metadata);
    }

    /// Paths of every still-unresolved class, sorted.
    pub fn stubbed_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .classes
            .iter()
            .filter(|(_, meta)| meta.is_stubbed)
            .map(|(path, _)| path.as_str())
            .collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Builds the typed graph and diagram for a diagram payload.
///
/// Listed types are registered first so their own definitions always win;
/// members are attached in a second pass, stubbing any type the payload only
/// references. The diagram views are resolved last.
pub fn build(info: &DiagramInfo) -> Result<(Diagram, SymbolGraph, StubMetadata)> {
    let mut graph = SymbolGraph::new();
    let mut stubs = StubMetadata::default();
    let mut reconstructor = GraphReconstructor::new(&mut graph, &mut stubs);

    if let Some(domain) = &info.domain_info {
        for class in &domain.classes {
            reconstructor.register_class(class);
        }
        for profile in &domain.profiles {
            reconstructor.add_profile(profile);
        }
        for enumeration in &domain.enumerations {
            reconstructor.add_enumeration(enumeration);
        }
        for class in &domain.classes {
            let path = class.path();
            let idx = reconstructor
                .graph
                .class_index(&path)
                .ok_or(GraphError::ClassNotFound(path))?;
            reconstructor.build_class(idx, class)?;
        }
    }

    let diagram = reconstructor.build_diagram(info)?;
    log::debug!(
        "Rebuilt diagram {} with {} type view(s), {} stub class(es)",
        diagram.path,
        diagram.class_views.len(),
        stubs.stubbed_paths().len()
    );
    Ok((diagram, graph, stubs))
}

/// Pulls one more class into an existing graph.
///
/// A class that is still a stub is resolved in place, so every edge already
/// pointing at it stays valid. Specializations become subclasses, stubbed
/// when unknown.
pub fn add_class_to_graph(
    info: &DiagramClassInfo,
    graph: &mut SymbolGraph,
    stubs: &mut StubMetadata,
) -> Result<NodeIndex> {
    let mut reconstructor = GraphReconstructor::new(graph, stubs);

    for profile in &info.profiles {
        if reconstructor.graph.profile(&profile.path()).is_none() {
            reconstructor.add_profile(profile);
        }
    }
    for enumeration in &info.enumerations {
        if reconstructor.graph.enumeration_index(&enumeration.path()).is_none() {
            reconstructor.add_enumeration(enumeration);
        }
    }

    let class = &info.class;
    let path = class.path();
    let idx = if let Some(idx) = reconstructor.graph.class_index(&path) {
        idx
    } else if reconstructor.graph.find(&path).is_some() {
        return Err(GraphError::NotAClass(path));
    } else {
        reconstructor.graph.add_element(
            &class.package,
            &class.name,
            ElementKind::Class(ClassNode::default()),
        )
    };
    let was_stubbed = reconstructor
        .stubs
        .get(&path)
        .map_or(true, |meta| meta.is_stubbed);
    reconstructor.stubs.set(
        path.clone(),
        ClassMetadata {
            is_stubbed: false,
            source_information: class.source_information.clone(),
        },
    );

    for pointer in &info.specializations {
        let sub = reconstructor
            .get_or_create_class(&pointer.path(), pointer.source_information.clone())?;
        reconstructor.graph.ensure_relation(idx, sub, Relation::SubType);
        reconstructor.graph.ensure_relation(sub, idx, Relation::SuperType);
    }

    if was_stubbed {
        reconstructor.build_class(idx, class)?;
    }
    Ok(idx)
}

/// Shared state of one reconstruction pass.
struct GraphReconstructor<'a> {
    graph: &'a mut SymbolGraph,
    stubs: &'a mut StubMetadata,
}

impl<'a> GraphReconstructor<'a> {
    fn new(graph: &'a mut SymbolGraph, stubs: &'a mut StubMetadata) -> Self {
        Self { graph, stubs }
    }

    fn register_class(&mut self, class: &ClassRecord) -> NodeIndex {
        let idx = self.graph.add_element(
            &class.package,
            &class.name,
            ElementKind::Class(ClassNode::default()),
        );
        self.stubs.set(
            class.path(),
            ClassMetadata {
                is_stubbed: false,
                source_information: class.source_information.clone(),
            },
        );
        idx
    }

    fn add_profile(&mut self, profile: &ProfileRecord) -> NodeIndex {
        self.graph.add_element(
            &profile.package,
            &profile.name,
            ElementKind::Profile(ProfileNode {
                tags: profile.tags.clone(),
                stereotypes: profile.stereotypes.clone(),
            }),
        )
    }

    fn add_enumeration(&mut self, enumeration: &EnumerationRecord) -> NodeIndex {
        self.graph.add_element(
            &enumeration.package,
            &enumeration.name,
            ElementKind::Enumeration {
                values: enumeration.enum_values.clone(),
            },
        )
    }

    /// Returns the class at `path`, creating a stub when it is unknown.
    fn get_or_create_class(
        &mut self,
        path: &str,
        source_information: Option<SourceInformation>,
    ) -> Result<NodeIndex> {
        if let Some(idx) = self.graph.class_index(path) {
            return Ok(idx);
        }
        if self.graph.find(path).is_some() {
            return Err(GraphError::NotAClass(path.to_string()));
        }
        let (package, name) = split_element_path(path);
        let idx = self
            .graph
            .add_element(package, name, ElementKind::Class(ClassNode::default()));
        log::debug!("Stubbing class {path}");
        self.stubs.set(
            path,
            ClassMetadata {
                is_stubbed: true,
                source_information,
            },
        );
        Ok(idx)
    }

    fn build_class(&mut self, idx: NodeIndex, record: &ClassRecord) -> Result<()> {
        let mut class = ClassNode::default();

        for tagged in &record.tagged_values {
            self.require_profile_member(&tagged.tag.profile, "tag", &tagged.tag.value)?;
            class.tagged_values.push(TaggedValue {
                profile: tagged.tag.profile.clone(),
                tag: tagged.tag.value.clone(),
                value: tagged.value.clone(),
            });
        }
        for stereotype in &record.stereotypes {
            self.require_profile_member(&stereotype.profile, "stereotype", &stereotype.value)?;
            class.stereotypes.push(StereotypeRef {
                profile: stereotype.profile.clone(),
                value: stereotype.value.clone(),
            });
        }

        for generalization in &record.generalizations {
            let Some(raw_type) = generalization.raw_type.as_deref() else {
                continue;
            };
            let super_type = self.get_or_create_class(raw_type, None)?;
            self.graph.ensure_relation(idx, super_type, Relation::SuperType);
            self.graph.ensure_relation(super_type, idx, Relation::SubType);
        }

        for property in &record.properties {
            if let Some(property) = self.resolve_property(idx, property)? {
                class.properties.push(property);
            }
        }
        for property in &record.qualified_properties {
            if let Some(property) = self.resolve_property(idx, property)? {
                class.derived_properties.push(property);
            }
        }

        let target = self
            .graph
            .class_mut(idx)
            .ok_or_else(|| GraphError::ClassNotFound(record.path()))?;
        target.tagged_values.extend(class.tagged_values);
        target.stereotypes.extend(class.stereotypes);
        target.properties.extend(class.properties);
        target.derived_properties.extend(class.derived_properties);
        Ok(())
    }

    fn resolve_property(
        &mut self,
        owner: NodeIndex,
        record: &PropertyRecord,
    ) -> Result<Option<Property>> {
        // Unbound type parameters have nothing to point at.
        let Some(type_path) = record.generic_type.raw_type.as_deref() else {
            return Ok(None);
        };
        // Anything that is not a known enumeration is a class, primitives included.
        let (type_ref, target) = match self.graph.enumeration_index(type_path) {
            Some(enumeration) => (TypeRef::Enumeration(enumeration), enumeration),
            None => {
                let class = self.get_or_create_class(type_path, None)?;
                (TypeRef::Class(class), class)
            }
        };
        self.graph.add_edge(
            owner,
            target,
            Relation::PropertyType {
                property: record.name.clone(),
            },
        );
        Ok(Some(Property {
            name: record.name.clone(),
            multiplicity: Multiplicity::parse(&record.multiplicity)?,
            type_path: type_path.to_string(),
            type_ref,
        }))
    }

    fn require_profile_member(&self, profile: &str, kind: &'static str, value: &str) -> Result<()> {
        let node = self
            .graph
            .profile(profile)
            .ok_or_else(|| GraphError::ProfileNotFound(profile.to_string()))?;
        let members = match kind {
            "tag" => &node.tags,
            _ => &node.stereotypes,
        };
        if members.iter().any(|member| member == value) {
            Ok(())
        } else {
            Err(GraphError::ProfileMemberNotFound {
                profile: profile.to_string(),
                kind,
                value: value.to_string(),
            })
        }
    }

    fn build_diagram(&mut self, info: &DiagramInfo) -> Result<Diagram> {
        let record = &info.diagram;
        self.graph
            .add_element(&record.package, &record.name, ElementKind::Diagram);
        let mut diagram = Diagram {
            name: record.name.clone(),
            path: record.path(),
            ..Diagram::default()
        };

        for view in &record.type_views {
            let class = self.get_or_create_class(&view.type_path, None)?;
            diagram.class_views.push(ClassView {
                id: view.id.clone(),
                class,
                class_path: view.type_path.clone(),
                position: Point::new(view.position.x, view.position.y),
                rectangle: Rectangle {
                    width: view.rectangle_geometry.width,
                    height: view.rectangle_geometry.height,
                },
            });
        }

        for view in &record.property_views {
            let owner = &view.property.owning_type;
            let class = self
                .graph
                .class(owner)
                .ok_or_else(|| GraphError::ClassNotFound(owner.clone()))?;
            if class.property(&view.property.name).is_none() {
                return Err(GraphError::PropertyNotFound {
                    owner: owner.clone(),
                    property: view.property.name.clone(),
                });
            }
            let label = format!("{owner}.{}", view.property.name);
            let line = relationship(&diagram, &label, &view.source, &view.target, &view.geometry)?;
            diagram.property_views.push(PropertyView {
                owner_path: owner.clone(),
                property: view.property.name.clone(),
                line,
            });
        }

        for view in &record.generalization_views {
            let label = format!("{} -> {}", view.source, view.target);
            let line = relationship(&diagram, &label, &view.source, &view.target, &view.geometry)?;
            diagram.generalization_views.push(GeneralizationView { line });
        }

        Ok(diagram)
    }
}

fn relationship(
    diagram: &Diagram,
    label: &str,
    source: &str,
    target: &str,
    geometry: &GeometryRecord,
) -> Result<RelationshipView> {
    let resolve = |reference: &str| {
        diagram
            .class_view_position(reference)
            .ok_or_else(|| GraphError::DanglingViewReference {
                view: label.to_string(),
                reference: reference.to_string(),
            })
    };
    let mut line = RelationshipView {
        source: resolve(source)?,
        target: resolve(target)?,
        path: geometry
            .points
            .iter()
            .map(|point| Point::new(point.x, point.y))
            .collect(),
    };
    diagram.flatten_path(&mut line);
    Ok(line)
}
