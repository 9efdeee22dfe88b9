use crate::coordinate::FileCoordinate;
use serde::Deserialize;

/// Matches for one source file from a text search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultEntry {
    pub source_id: String,
    #[serde(default)]
    pub coordinates: Vec<SearchResultCoordinate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultCoordinate {
    pub start_line: i64,
    pub start_column: i64,
    pub end_line: i64,
    pub end_column: i64,
    #[serde(default)]
    pub preview: Option<String>,
}

/// The element under the cursor, as resolved by `getConceptPath`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UsageConcept {
    pub path: String,
    /// Owning class or enumeration for properties and enum values.
    #[serde(default)]
    pub owner: Option<String>,
    /// Set for enumeration values.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl UsageConcept {
    pub fn label(&self) -> String {
        match &self.owner {
            Some(owner) if self.kind.is_some() => format!("enum value {owner}.{}", self.path),
            Some(owner) => format!("property {owner}.{}", self.path),
            None => self.path.clone(),
        }
    }

    /// Server-side function that lists usages for this concept, with its arguments.
    pub fn usage_function(&self) -> (&'static str, Vec<String>) {
        let quoted = |value: &str| format!("'{value}'");
        match &self.owner {
            Some(owner) if self.kind.is_some() => (
                "meta::ide::findusages::findUsagesForEnum_String_1__String_1__SourceInformation_MANY_",
                vec![quoted(owner), quoted(&self.path)],
            ),
            Some(owner) => (
                "meta::ide::findusages::findUsagesForProperty_String_1__String_1__SourceInformation_MANY_",
                vec![quoted(owner), quoted(&self.path)],
            ),
            None => (
                "meta::ide::findusages::findUsagesForPath_String_1__SourceInformation_MANY_",
                vec![quoted(&self.path)],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub source: String,
    pub line: i64,
    pub column: i64,
}

impl Usage {
    pub fn coordinate(&self) -> Option<FileCoordinate> {
        FileCoordinate::new(self.source.clone(), self.line, self.column).ok()
    }
}
