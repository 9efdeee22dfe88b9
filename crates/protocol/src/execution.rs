use crate::coordinate::{first_line, FileCoordinate};
use crate::decode::{as_object, decode, flag, lenient_bool};
use crate::error::Result;
use crate::test_run::TestInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Result of an `execute` round-trip, decoded from its discriminating fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success(ExecutionSuccess),
    Failure(ExecutionFailure),
    UnmatchedSymbol(UnmatchedSymbolFailure),
    UnmatchedFunction(UnmatchedFunctionFailure),
    TestExecution(TestExecution),
    Concept(ConceptJump),
    /// Output with no follow-up semantics.
    Text(String),
}

impl ExecutionResult {
    /// Decodes a raw execution response.
    ///
    /// `error: true` (or a top-level `source`) selects the failure family, refined
    /// by the candidate lists. Otherwise `jumpTo`, `tests` and `reinit` pick the
    /// remaining variants in that order.
    pub fn from_value(value: Value) -> Result<Self> {
        let map = as_object(&value, "execution result")?;

        if flag(map, "error") || map.contains_key("source") {
            if map.contains_key("candidates") {
                if map.contains_key("candidatesWithPackageImported") {
                    return decode(value, "unmatched function result").map(Self::UnmatchedFunction);
                }
                return decode(value, "unmatched result").map(Self::UnmatchedSymbol);
            }
            return decode(value, "execution failure").map(Self::Failure);
        }
        if map.contains_key("jumpTo") {
            return decode(value, "concept result").map(Self::Concept);
        }
        if map.contains_key("tests") {
            return decode(value, "test execution result").map(Self::TestExecution);
        }
        if map.contains_key("reinit") {
            return decode(value, "execution success").map(Self::Success);
        }

        let text = map
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Self::Text(text))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Success(result) => &result.text,
            Self::Failure(failure) => &failure.text,
            Self::UnmatchedSymbol(result) => &result.failure.text,
            Self::UnmatchedFunction(result) => &result.failure.text,
            Self::TestExecution(result) => &result.text,
            Self::Concept(result) => &result.text,
            Self::Text(text) => text,
        }
    }

    /// The failure payload shared by every failure variant.
    pub fn failure(&self) -> Option<&ExecutionFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::UnmatchedSymbol(result) => Some(&result.failure),
            Self::UnmatchedFunction(result) => Some(&result.failure),
            _ => None,
        }
    }

    pub fn session_error(&self) -> Option<&str> {
        self.failure().and_then(|f| f.session_error.as_deref())
    }

    pub fn is_failure(&self) -> bool {
        self.failure().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSuccess {
    #[serde(default)]
    pub text: String,
    /// Files the execution changed server-side; open buffers must be reloaded.
    #[serde(default)]
    pub modified_files: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub reinit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFailure {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub line: Option<i64>,
    #[serde(default)]
    pub column: Option<i64>,
    /// Present when the server session can no longer be trusted.
    #[serde(default)]
    pub session_error: Option<String>,
}

impl ExecutionFailure {
    /// Where the failure happened, carrying the first line of the error text.
    pub fn coordinate(&self) -> Option<FileCoordinate> {
        let source = self.source.as_deref()?;
        FileCoordinate::new(source, self.line?, self.column?)
            .ok()
            .map(|c| c.with_error_text(&self.text))
    }

    pub fn headline(&self) -> Option<&str> {
        first_line(&self.text)
    }
}

/// Fix suggestion attached to unresolved identifiers and unmatched functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(rename = "sourceID")]
    pub source_id: String,
    #[serde(default)]
    pub line: i64,
    #[serde(default)]
    pub column: i64,
    pub found_name: String,
    #[serde(default)]
    pub file_to_be_modified: Option<String>,
    #[serde(default)]
    pub line_to_be_modified: Option<i64>,
    #[serde(default)]
    pub column_to_be_modified: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub add: bool,
    #[serde(default)]
    pub message_to_be_modified: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Candidate {
    pub fn location(&self) -> Option<FileCoordinate> {
        FileCoordinate::new(self.source_id.clone(), self.line, self.column).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedSymbolFailure {
    #[serde(flatten)]
    pub failure: ExecutionFailure,
    #[serde(default)]
    pub candidate_name: String,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedFunctionFailure {
    #[serde(flatten)]
    pub failure: ExecutionFailure,
    #[serde(default)]
    pub candidate_name: String,
    /// Candidates whose package still needs an import.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub candidates_with_package_imported: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExecution {
    #[serde(default)]
    pub text: String,
    pub runner_id: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub relevant_tests_only: bool,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub tests: Vec<TestInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptJump {
    #[serde(default)]
    pub text: String,
    pub jump_to: JumpTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JumpTarget {
    pub source: String,
    pub line: i64,
    pub column: i64,
}

impl JumpTarget {
    pub fn coordinate(&self) -> Option<FileCoordinate> {
        FileCoordinate::new(self.source.clone(), self.line, self.column).ok()
    }
}

/// Status reported while an execution is still running server-side.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ExecutionActivity {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub executing: bool,
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn failure_with_source_decodes_coordinate() {
        let result = ExecutionResult::from_value(json!({
            "error": true,
            "text": "Compilation error at (resource:/a.pure line:3 column:5)\nmore",
            "source": "/a.pure",
            "line": 3,
            "column": 5,
        }))
        .expect("decode");

        let failure = result.failure().expect("failure");
        let coordinate = failure.coordinate().expect("coordinate");
        assert_eq!(coordinate.file(), "/a.pure");
        assert_eq!(coordinate.line(), 3);
        assert_eq!(
            coordinate.error_message(),
            Some("Compilation error at (resource:/a.pure line:3 column:5)")
        );
        assert!(result.session_error().is_none());
    }

    #[test]
    fn candidate_lists_select_unmatched_variants() {
        let unmatched = ExecutionResult::from_value(json!({
            "error": "true",
            "text": "Can't find type 'Person'",
            "candidateName": "Person",
            "candidates": [{
                "sourceID": "/model.pure",
                "line": 2,
                "column": 7,
                "foundName": "model::Person",
                "fileToBeModified": "/a.pure",
                "lineToBeModified": 1,
                "columnToBeModified": 1,
                "add": true,
                "messageToBeModified": "import model::*;",
                "type": "Class"
            }]
        }))
        .expect("decode");
        let ExecutionResult::UnmatchedSymbol(result) = unmatched else {
            panic!("expected unmatched symbol, got {unmatched:?}");
        };
        assert_eq!(result.candidate_name, "Person");
        assert_eq!(result.candidates[0].kind.as_deref(), Some("Class"));
        assert!(result.candidates[0].add);

        let function = ExecutionResult::from_value(json!({
            "error": true,
            "candidateName": "go",
            "candidates": [],
            "candidatesWithPackageImported": [],
        }))
        .expect("decode");
        assert!(matches!(function, ExecutionResult::UnmatchedFunction(_)));
    }

    #[test]
    fn success_discriminated_by_reinit() {
        let result = ExecutionResult::from_value(json!({
            "text": "done",
            "reinit": false,
            "modifiedFiles": ["/b.pure", "/a.pure", "/a.pure"],
        }))
        .expect("decode");
        let ExecutionResult::Success(success) = result else {
            panic!("expected success");
        };
        assert_eq!(
            success.modified_files.into_iter().collect::<Vec<_>>(),
            vec!["/a.pure".to_string(), "/b.pure".to_string()]
        );
        assert!(!success.reinit);
    }

    #[test]
    fn session_error_is_exposed_on_failures() {
        let result = ExecutionResult::from_value(json!({
            "error": true,
            "text": "boom",
            "sessionError": "runtime state lost",
        }))
        .expect("decode");
        assert_eq!(result.session_error(), Some("runtime state lost"));
        assert!(result.failure().and_then(ExecutionFailure::coordinate).is_none());
    }

    #[test]
    fn jump_and_plain_text_variants() {
        let jump = ExecutionResult::from_value(json!({
            "text": "",
            "jumpTo": {"source": "/m.pure", "line": 4, "column": 2}
        }))
        .expect("decode");
        let ExecutionResult::Concept(concept) = jump else {
            panic!("expected concept");
        };
        assert_eq!(concept.jump_to.coordinate().map(|c| c.line()), Some(4));

        let plain = ExecutionResult::from_value(json!({"text": "hello"})).expect("decode");
        assert_eq!(plain, ExecutionResult::Text("hello".to_string()));
        assert!(ExecutionResult::from_value(json!([1, 2])).is_err());
    }
}
