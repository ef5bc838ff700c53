use serde::Deserialize;
use std::fmt;

/// A single student entry as read from the roster file.
///
/// Fields are declared in column order. The decoder deserializes rows
/// positionally, so this order is the file's column order and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    pub age: i32,
    /// Grade or score, stored as a whole number.
    pub grade: i32,
    pub gender: String,
}

impl StudentRecord {
    pub fn new(name: impl Into<String>, age: i32, grade: i32, gender: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            grade,
            gender: gender.into(),
        }
    }
}

/// A row that could not be decoded into a `StudentRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    /// 1-based physical line of the row in the source file.
    pub line: u64,
    /// The row's fields joined back together with the source delimiter.
    pub raw: String,
    pub reason: String,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line, self.reason, self.raw)
    }
}
