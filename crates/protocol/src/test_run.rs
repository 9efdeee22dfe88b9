use crate::coordinate::FileCoordinate;
use serde::Deserialize;

/// One node of the test hierarchy returned when a test run starts.
///
/// Packages carry children; concrete tests carry a `type` and their location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInfo {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<i64>,
    #[serde(default)]
    pub column: Option<i64>,
    #[serde(default)]
    pub children: Vec<TestInfo>,
}

impl TestInfo {
    pub fn is_test(&self) -> bool {
        self.kind.is_some()
    }

    pub fn coordinate(&self) -> Option<FileCoordinate> {
        FileCoordinate::new(self.file.clone()?, self.line?, self.column?).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum TestResultStatus {
    Success,
    Failure,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestResult {
    /// Element path segments of the test function.
    pub test: Vec<String>,
    pub status: TestResultStatus,
    #[serde(default)]
    pub error: Option<TestFailureInfo>,
}

impl TestResult {
    /// Id of the matching [`TestInfo`] node.
    pub fn test_id(&self) -> String {
        self.test.join(crate::paths::ELEMENT_PATH_DELIMITER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestFailureInfo {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub line: Option<i64>,
    #[serde(default)]
    pub column: Option<i64>,
}

/// Poll response for a running test runner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct TestRunStatus {
    #[serde(default, deserialize_with = "crate::decode::lenient_bool")]
    pub finished: bool,
    #[serde(default)]
    pub tests: Vec<TestResult>,
}
