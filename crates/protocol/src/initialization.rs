use crate::coordinate::FileCoordinate;
use crate::decode::{as_object, decode, flag, lenient_bool};
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializationResult {
    Success(InitializationSuccess),
    Failure(InitializationFailure),
    FailureWithSource(InitializationFailureWithSource),
}

impl InitializationResult {
    pub fn from_value(value: Value) -> Result<Self> {
        let map = as_object(&value, "initialization result")?;
        if !flag(map, "error") {
            return decode(value, "initialization success").map(Self::Success);
        }
        if map.contains_key("source") {
            return decode(value, "initialization failure").map(Self::FailureWithSource);
        }
        decode(value, "initialization failure").map(Self::Failure)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success(result) => result.text.as_deref(),
            Self::Failure(result) => result.text.as_deref(),
            Self::FailureWithSource(result) => result.text.as_deref(),
        }
        .filter(|text| !text.is_empty())
    }

    pub fn session_error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(result) => result.session_error.as_deref(),
            Self::FailureWithSource(result) => result.session_error.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct InitializationSuccess {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationFailure {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub session_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationFailureWithSource {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub session_error: Option<String>,
    pub source: String,
    #[serde(default)]
    pub line: i64,
    #[serde(default)]
    pub column: i64,
}

impl InitializationFailureWithSource {
    pub fn coordinate(&self) -> Option<FileCoordinate> {
        FileCoordinate::new(self.source.clone(), self.line, self.column)
            .ok()
            .map(|c| c.with_error_text(self.text.as_deref().unwrap_or_default()))
    }
}

/// Status reported while the server is (re)building its session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct InitializationActivity {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub initializing: bool,
    #[serde(default)]
    pub text: Option<String>,
}
