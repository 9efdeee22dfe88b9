use petgraph::graph::NodeIndex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rectangle {
    pub width: f64,
    pub height: f64,
}

/// A class box placed on the diagram canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassView {
    pub id: String,
    pub class: NodeIndex,
    pub class_path: String,
    pub position: Point,
    pub rectangle: Rectangle,
}

impl ClassView {
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.rectangle.width / 2.0,
            self.position.y + self.rectangle.height / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.position.x
            && point.x <= self.position.x + self.rectangle.width
            && point.y >= self.position.y
            && point.y <= self.position.y + self.rectangle.height
    }
}

/// Endpoints (indices into [`Diagram::class_views`]) and bend points of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipView {
    pub source: usize,
    pub target: usize,
    pub path: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyView {
    pub owner_path: String,
    pub property: String,
    pub line: RelationshipView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneralizationView {
    pub line: RelationshipView,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Diagram {
    pub name: String,
    pub path: String,
    pub class_views: Vec<ClassView>,
    pub property_views: Vec<PropertyView>,
    pub generalization_views: Vec<GeneralizationView>,
}

impl Diagram {
    pub fn class_view(&self, id: &str) -> Option<&ClassView> {
        self.class_views.iter().find(|view| view.id == id)
    }

    pub(crate) fn class_view_position(&self, id: &str) -> Option<usize> {
        self.class_views.iter().position(|view| view.id == id)
    }

    /// Source center, bend points, target center.
    pub fn full_path(&self, line: &RelationshipView) -> Vec<Point> {
        let mut points = Vec::with_capacity(line.path.len() + 2);
        points.extend(self.class_views.get(line.source).map(ClassView::center));
        points.extend(line.path.iter().copied());
        points.extend(self.class_views.get(line.target).map(ClassView::center));
        points
    }

    /// Drops bend points hidden under either endpoint's box.
    pub(crate) fn flatten_path(&self, line: &mut RelationshipView) {
        let (Some(source), Some(target)) =
            (self.class_views.get(line.source), self.class_views.get(line.target))
        else {
            return;
        };
        line.path
            .retain(|&point| !source.contains(point) && !target.contains(point));
    }
}
