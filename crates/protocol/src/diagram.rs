//! Diagram and domain records returned by the diagram info endpoints.
//!
//! These mirror the server's flattened shapes; `pure-ide-graph` turns them into
//! a linked graph.

use crate::coordinate::SourceInformation;
use crate::paths::join_element_path;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramInfo {
    pub name: String,
    pub diagram: DiagramRecord,
    #[serde(default)]
    pub domain_info: Option<DiagramDomainInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramDomainInfo {
    pub classes: Vec<ClassRecord>,
    pub enumerations: Vec<EnumerationRecord>,
    pub profiles: Vec<ProfileRecord>,
}

/// Payload used to pull one more class into an already built diagram graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramClassInfo {
    pub class: ClassRecord,
    #[serde(default)]
    pub enumerations: Vec<EnumerationRecord>,
    #[serde(default)]
    pub profiles: Vec<ProfileRecord>,
    #[serde(default)]
    pub specializations: Vec<ElementPointer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPointer {
    #[serde(default)]
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub source_information: Option<SourceInformation>,
}

impl ElementPointer {
    pub fn path(&self) -> String {
        join_element_path(&self.package, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    #[serde(default)]
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub source_information: Option<SourceInformation>,
    #[serde(default)]
    pub stereotypes: Vec<StereotypeRecord>,
    #[serde(default)]
    pub tagged_values: Vec<TaggedValueRecord>,
    #[serde(default)]
    pub generalizations: Vec<GenericTypeRecord>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub qualified_properties: Vec<PropertyRecord>,
}

impl ClassRecord {
    pub fn path(&self) -> String {
        join_element_path(&self.package, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericTypeRecord {
    /// Unset for unbound type parameters.
    #[serde(default)]
    pub raw_type: Option<String>,
    #[serde(default)]
    pub type_parameter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub name: String,
    pub multiplicity: String,
    #[serde(default)]
    pub generic_type: GenericTypeRecord,
    #[serde(default)]
    pub stereotypes: Vec<StereotypeRecord>,
    #[serde(default)]
    pub tagged_values: Vec<TaggedValueRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StereotypeRecord {
    pub profile: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub profile: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedValueRecord {
    pub tag: TagRecord,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stereotypes: Vec<String>,
}

impl ProfileRecord {
    pub fn path(&self) -> String {
        join_element_path(&self.package, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationRecord {
    #[serde(default)]
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub enum_values: Vec<String>,
}

impl EnumerationRecord {
    pub fn path(&self) -> String {
        join_element_path(&self.package, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramRecord {
    #[serde(default)]
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub stereotypes: Vec<StereotypeRecord>,
    #[serde(default)]
    pub tagged_values: Vec<TaggedValueRecord>,
    #[serde(default)]
    pub type_views: Vec<TypeViewRecord>,
    #[serde(default)]
    pub property_views: Vec<PropertyViewRecord>,
    #[serde(default)]
    pub generalization_views: Vec<GeneralizationViewRecord>,
}

impl DiagramRecord {
    pub fn path(&self) -> String {
        join_element_path(&self.package, &self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RectangleRecord {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryRecord {
    #[serde(default)]
    pub points: Vec<PointRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeViewRecord {
    pub id: String,
    /// Full path of the viewed class.
    #[serde(rename = "type")]
    pub type_path: String,
    #[serde(default)]
    pub position: PointRecord,
    #[serde(default)]
    pub rectangle_geometry: RectangleRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPointerRecord {
    pub name: String,
    pub owning_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyViewRecord {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    pub property: PropertyPointerRecord,
    #[serde(default)]
    pub geometry: GeometryRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralizationViewRecord {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub geometry: GeometryRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diagram_info_decodes_without_domain() {
        let info: DiagramInfo = serde_json::from_value(json!({
            "name": "MyDiagram",
            "diagram": {
                "package": "model",
                "name": "MyDiagram",
                "typeViews": [{
                    "id": "Foo_1",
                    "type": "model::Foo",
                    "position": {"x": 10.0, "y": 20.5},
                    "rectangleGeometry": {"width": 120.0, "height": 40.0}
                }]
            }
        }))
        .expect("decode");

        assert!(info.domain_info.is_none());
        assert_eq!(info.diagram.path(), "model::MyDiagram");
        let view = &info.diagram.type_views[0];
        assert_eq!(view.type_path, "model::Foo");
        assert_eq!(view.rectangle_geometry.width, 120.0);
        assert!(info.diagram.property_views.is_empty());
    }

    #[test]
    fn root_package_elements_have_bare_paths() {
        let class: ClassRecord =
            serde_json::from_value(json!({"package": "", "name": "Thing"})).expect("decode");
        assert_eq!(class.path(), "Thing");
        assert!(class.source_information.is_none());
    }
}
