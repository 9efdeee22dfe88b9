use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cursor or diagnostic position inside a workspace file.
///
/// Lines and columns are 1-based; the constructor rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileCoordinate {
    file: String,
    line: u32,
    column: u32,
    error_message: Option<String>,
}

impl FileCoordinate {
    pub fn new(file: impl Into<String>, line: i64, column: i64) -> Result<Self> {
        let file = file.into();
        match (u32::try_from(line), u32::try_from(column)) {
            (Ok(l), Ok(c)) if l >= 1 && c >= 1 => Ok(Self {
                file,
                line: l,
                column: c,
                error_message: None,
            }),
            _ => Err(ProtocolError::InvalidCoordinate { file, line, column }),
        }
    }

    /// Attaches the first non-empty line of `text` as the error message.
    pub fn with_error_text(mut self, text: &str) -> Self {
        self.error_message = first_line(text).map(str::to_string);
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

impl fmt::Display for FileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Source span attached to compiled elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInformation {
    pub source_id: String,
    #[serde(default)]
    pub line: i64,
    #[serde(default)]
    pub column: i64,
    #[serde(default)]
    pub start_line: i64,
    #[serde(default)]
    pub start_column: i64,
    #[serde(default)]
    pub end_line: i64,
    #[serde(default)]
    pub end_column: i64,
}

impl SourceInformation {
    pub fn coordinate(&self) -> Option<FileCoordinate> {
        FileCoordinate::new(self.source_id.clone(), self.line, self.column).ok()
    }
}

pub(crate) fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim_end).find(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_are_one_based() {
        assert!(FileCoordinate::new("/a.pure", 0, 1).is_err());
        assert!(FileCoordinate::new("/a.pure", 1, -1).is_err());
        let coordinate = FileCoordinate::new("/a.pure", 3, 7).expect("coordinate");
        assert_eq!(coordinate.to_string(), "/a.pure:3:7");
    }

    #[test]
    fn error_text_keeps_first_non_empty_line() {
        let coordinate = FileCoordinate::new("/a.pure", 1, 1)
            .expect("coordinate")
            .with_error_text("\n\nCompilation error at line 1\nstack");
        assert_eq!(coordinate.error_message(), Some("Compilation error at line 1"));
    }
}
