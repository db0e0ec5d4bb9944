//! GraphQL response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One entry of a response's `errors` list.
///
/// Displays as the message followed by the failing field path, e.g.
/// `job not found (at job)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    /// Where in the sent document the problem was found.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<GraphQLLocation>,
    /// Response path of the field that failed to resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    /// Service-defined details such as an error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    /// Create an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
        }
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = &self.message;
        match self.path.as_deref() {
            Some(path) if !path.is_empty() => {
                let path = path
                    .iter()
                    .map(PathSegment::to_string)
                    .collect::<Vec<_>>()
                    .join(".");
                write!(f, "{message} (at {path})")
            }
            _ => f.write_str(message),
        }
    }
}

impl std::error::Error for GraphQLError {}

/// A 1-based line and column in the sent document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLLocation {
    pub line: u32,
    pub column: u32,
}

/// A field name or list index in an error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Field(String),
    /// An array index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A GraphQL response from the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    /// The data returned by the operation. `null` and absent both map to `None`.
    #[serde(default)]
    pub data: Option<Value>,

    /// Errors that occurred during execution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,

    /// Additional response metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLResponse {
    /// A response carrying only data.
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// Check if the response contains errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the response was successful (has data and no errors).
    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.errors.is_empty()
    }

    /// Check if the response carries both data and errors.
    pub fn is_partial(&self) -> bool {
        self.data.is_some() && !self.errors.is_empty()
    }

    /// Get the first error, if any.
    pub fn first_error(&self) -> Option<&GraphQLError> {
        self.errors.first()
    }
}
