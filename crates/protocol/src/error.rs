use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Expected a JSON object for {0}")]
    NotAnObject(&'static str),

    #[error("Malformed {kind}: {source}")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid coordinate {file}:{line}:{column} (line and column start at 1)")]
    InvalidCoordinate { file: String, line: i64, column: i64 },
}

impl ProtocolError {
    pub(crate) fn malformed(kind: &'static str, source: serde_json::Error) -> Self {
        Self::Malformed { kind, source }
    }
}
