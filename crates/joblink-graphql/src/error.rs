//! Error types for the GraphQL client.

use crate::registry::OperationKind;
use crate::transport::GraphQLError;

/// Failures raised while talking to the GraphQL endpoint.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),
    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Request timed out.
    #[error("Request timed out")]
    Timeout,
    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(String),
    /// The response body was not a GraphQL response.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
    /// HTTP error status (4xx or 5xx).
    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Response body, if one could be read.
        message: Option<String>,
    },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::InvalidBody(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for TransportError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for TransportError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// Errors surfaced by the client facade and the operation registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a GraphQL response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with errors and no data.
    #[error("GraphQL error: {}", join_messages(.errors))]
    Graph {
        /// Errors reported by the service.
        errors: Vec<GraphQLError>,
    },

    /// A definition spreads a fragment that is not registered.
    #[error("'{definition}' references unknown fragment '{fragment}'")]
    UnknownFragment {
        /// Operation or fragment containing the spread.
        definition: String,
        /// Name of the missing fragment.
        fragment: String,
    },

    /// No operation is registered under this name.
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    /// A definition with this name is already registered.
    #[error("'{0}' is already registered")]
    DuplicateDefinition(String),

    /// A query was passed to `mutate` or a mutation to `query`.
    #[error("Operation '{name}' is not a {expected}")]
    WrongOperationKind {
        /// Operation name.
        name: String,
        /// The kind the caller required.
        expected: OperationKind,
    },

    /// The service answered with neither data nor errors.
    #[error("No data in response to '{0}'")]
    MissingData(String),

    /// A root field was absent from the response data.
    #[error("Field '{field}' missing from response to '{operation}'")]
    MissingField {
        /// Operation name.
        operation: String,
        /// Root field name.
        field: String,
    },

    /// A cache-only query could not be answered from the cache.
    #[error("'{0}' is not cached")]
    CacheMiss(String),

    /// Response data did not match the requested type.
    #[error("Failed to decode response data: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Create an unknown-fragment error.
    pub fn unknown_fragment(definition: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::UnknownFragment {
            definition: definition.into(),
            fragment: fragment.into(),
        }
    }

    /// Errors reported by the service, if this is a GraphQL error.
    pub fn graph_errors(&self) -> &[GraphQLError] {
        match self {
            Self::Graph { errors } => errors,
            _ => &[],
        }
    }
}

fn join_messages(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A specialized Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let err = TransportError::HttpStatus {
            status: 502,
            message: Some("bad gateway".into()),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");

        let err = TransportError::HttpStatus {
            status: 404,
            message: None,
        };
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[test]
    fn test_graph_error_joins_messages() {
        let err = Error::Graph {
            errors: vec![GraphQLError::new("not found"), GraphQLError::new("denied")],
        };
        assert_eq!(err.to_string(), "GraphQL error: not found; denied");
        assert_eq!(err.graph_errors().len(), 2);
    }
}
