use crate::error::{ProtocolError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub(crate) fn as_object<'a>(value: &'a Value, kind: &'static str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or(ProtocolError::NotAnObject(kind))
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value, kind: &'static str) -> Result<T> {
    serde_json::from_value(value).map_err(|err| ProtocolError::malformed(kind, err))
}

/// Reads a boolean discriminator. The server emits some flags as `"true"` strings.
pub(crate) fn flag(map: &Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(Value::Bool(value)) => *value,
        Some(Value::String(value)) => value.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Serde adapter for the same string-or-bool flags.
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(value)) => value,
        Some(Flag::Text(value)) => value.eq_ignore_ascii_case("true"),
        None => false,
    })
}
