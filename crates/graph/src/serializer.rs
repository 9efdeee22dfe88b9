use crate::diagram::{Diagram, Point};

/// Renders a diagram back into the diagram grammar so edits can be saved.
///
/// Output is fully determined by the views: fixed field order, five decimal
/// places for every coordinate. Relationship views have no ids on the wire, so
/// they are numbered by position.
pub fn serialize_diagram(diagram: &Diagram) -> String {
    let type_views = diagram.class_views.iter().map(|view| {
        format!(
            "    TypeView {id}(\n\
             \x20       type={class},\n\
             \x20       position=({x}, {y}),\n\
             \x20       width={width},\n\
             \x20       height={height},\n\
             \x20       stereotypesVisible=true,\n\
             \x20       attributesVisible=true,\n\
             \x20       attributeStereotypesVisible=true,\n\
             \x20       attributeTypesVisible=true,\n\
             \x20       color=#FFFFCC,\n\
             \x20       lineWidth=1.0)",
            id = view.id,
            class = view.class_path,
            x = fixed(view.position.x),
            y = fixed(view.position.y),
            width = fixed(view.rectangle.width),
            height = fixed(view.rectangle.height),
        )
    });

    let generalization_views = diagram
        .generalization_views
        .iter()
        .enumerate()
        .map(|(idx, view)| {
            format!(
                "    GeneralizationView gview_{idx}(\n\
                 \x20       source={source},\n\
                 \x20       target={target},\n\
                 \x20       points=[{points}],\n\
                 \x20       label='',\n\
                 \x20       color=#000000,\n\
                 \x20       lineWidth=-1.0,\n\
                 \x20       lineStyle=SIMPLE)",
                source = view_id(diagram, view.line.source),
                target = view_id(diagram, view.line.target),
                points = points(&diagram.full_path(&view.line)),
            )
        });

    let property_views = diagram
        .property_views
        .iter()
        .enumerate()
        .map(|(idx, view)| {
            format!(
                "    PropertyView pview_{idx}(\n\
                 \x20       property={owner}.{property},\n\
                 \x20       source={source},\n\
                 \x20       target={target},\n\
                 \x20       points=[{points}],\n\
                 \x20       label='',\n\
                 \x20       propertyPosition=(0.0,0.0),\n\
                 \x20       multiplicityPosition=(0.0,0.0),\n\
                 \x20       color=#000000,\n\
                 \x20       lineWidth=-1.0,\n\
                 \x20       stereotypesVisible=true,\n\
                 \x20       nameVisible=true,\n\
                 \x20       lineStyle=SIMPLE)",
                owner = view.owner_path,
                property = view.property,
                source = view_id(diagram, view.line.source),
                target = view_id(diagram, view.line.target),
                points = points(&diagram.full_path(&view.line)),
            )
        });

    let views: Vec<String> = type_views
        .chain(generalization_views)
        .chain(property_views)
        .collect();

    format!(
        "Diagram {}(width=0.0, height=0.0)\n{{\n{}\n}}",
        diagram.path,
        views.join("\n\n")
    )
}

fn view_id(diagram: &Diagram, idx: usize) -> &str {
    diagram
        .class_views
        .get(idx)
        .map(|view| view.id.as_str())
        .unwrap_or_default()
}

fn points(path: &[Point]) -> String {
    path.iter()
        .map(|point| format!("({},{})", fixed(point.x), fixed(point.y)))
        .collect::<Vec<_>>()
        .join(",")
}

fn fixed(value: f64) -> String {
    // Avoid printing "-0.00000".
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value:.5}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{ClassView, GeneralizationView, PropertyView, Rectangle, RelationshipView};
    use petgraph::graph::NodeIndex;
    use pretty_assertions::assert_eq;

    fn class_view(id: &str, class_path: &str, x: f64) -> ClassView {
        ClassView {
            id: id.to_string(),
            class: NodeIndex::new(0),
            class_path: class_path.to_string(),
            position: Point::new(x, 0.0),
            rectangle: Rectangle {
                width: 100.0,
                height: 40.0,
            },
        }
    }

    #[test]
    fn renders_views_in_grammar_order() {
        let diagram = Diagram {
            name: "D".to_string(),
            path: "model::D".to_string(),
            class_views: vec![class_view("a", "model::A", 0.0), class_view("b", "model::B", 200.0)],
            property_views: vec![PropertyView {
                owner_path: "model::A".to_string(),
                property: "b".to_string(),
                line: RelationshipView {
                    source: 0,
                    target: 1,
                    path: Vec::new(),
                },
            }],
            generalization_views: vec![GeneralizationView {
                line: RelationshipView {
                    source: 1,
                    target: 0,
                    path: vec![Point::new(150.0, -20.5)],
                },
            }],
        };

        let expected = "\
Diagram model::D(width=0.0, height=0.0)
{
    TypeView a(
        type=model::A,
        position=(0.00000, 0.00000),
        width=100.00000,
        height=40.00000,
        stereotypesVisible=true,
        attributesVisible=true,
        attributeStereotypesVisible=true,
        attributeTypesVisible=true,
        color=#FFFFCC,
        lineWidth=1.0)

    TypeView b(
        type=model::B,
        position=(200.00000, 0.00000),
        width=100.00000,
        height=40.00000,
        stereotypesVisible=true,
        attributesVisible=true,
        attributeStereotypesVisible=true,
        attributeTypesVisible=true,
        color=#FFFFCC,
        lineWidth=1.0)

    GeneralizationView gview_0(
        source=b,
        target=a,
        points=[(250.00000,20.00000),(150.00000,-20.50000),(50.00000,20.00000)],
        label='',
        color=#000000,
        lineWidth=-1.0,
        lineStyle=SIMPLE)

    PropertyView pview_0(
        property=model::A.b,
        source=a,
        target=b,
        points=[(50.00000,20.00000),(250.00000,20.00000)],
        label='',
        propertyPosition=(0.0,0.0),
        multiplicityPosition=(0.0,0.0),
        color=#000000,
        lineWidth=-1.0,
        stereotypesVisible=true,
        nameVisible=true,
        lineStyle=SIMPLE)
}";
        assert_eq!(serialize_diagram(&diagram), expected);
    }

    #[test]
    fn empty_diagram_has_empty_body() {
        let diagram = Diagram {
            path: "D".to_string(),
            ..Diagram::default()
        };
        assert_eq!(serialize_diagram(&diagram), "Diagram D(width=0.0, height=0.0)\n{\n\n}");
    }
}
