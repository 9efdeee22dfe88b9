use crate::decode::lenient_bool;
use serde::{Deserialize, Serialize};

/// File content as returned by `getFile`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PureFile {
    #[serde(default)]
    pub content: String,
}

/// An open buffer as sent along with every execution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenFileRequest {
    pub path: String,
    pub code: String,
}

/// One level of the workspace directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: String,
    pub path: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "file", deserialize_with = "lenient_bool")]
    pub is_file: bool,
    #[serde(default, rename = "RO", deserialize_with = "lenient_bool")]
    pub read_only: bool,
    #[serde(default, rename = "repo", deserialize_with = "lenient_bool")]
    pub is_repository: bool,
}

/// One level of the compiled symbol (concept) tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptEntry {
    /// Full element path, also the tree id.
    pub path: String,
    #[serde(default)]
    pub name: String,
    /// Metaclass name (`Package`, `Class`, `Property`, ...).
    #[serde(default, rename = "pureType")]
    pub kind: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<i64>,
    #[serde(default)]
    pub column: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_children: bool,
}

impl ConceptEntry {
    pub fn is_package(&self) -> bool {
        self.kind == "Package"
    }
}
