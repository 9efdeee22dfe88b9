use crate::decode::{as_object, decode, flag, lenient_bool};
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;

/// Outcome of a workspace mutation (create/delete file or folder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Success { text: String },
    Failure(CommandFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailure {
    #[serde(default)]
    pub text: String,
    /// The failure should be shown as a warning rather than console output.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub error_dialog: bool,
}

impl CommandResult {
    pub fn from_value(value: Value) -> Result<Self> {
        // Older endpoints answer with a bare error string.
        if let Value::String(text) = value {
            return Ok(Self::Failure(CommandFailure {
                text,
                error_dialog: true,
            }));
        }
        let map = as_object(&value, "command result")?;
        if flag(map, "error") {
            return decode(value, "command failure").map(Self::Failure);
        }
        let text = map
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Self::Success { text })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
