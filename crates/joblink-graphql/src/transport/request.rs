//! GraphQL request types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The JSON payload POSTed to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    /// The composed operation text.
    pub query: String,

    /// Variables for the operation. Always an object on the wire.
    #[serde(default = "empty_object")]
    pub variables: Value,

    /// The operation to execute within `query`.
    #[serde(skip_serializing_if = "Option::is_none", rename = "operationName")]
    pub operation_name: Option<String>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl GraphQLRequest {
    /// Create a request for the given operation text.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: empty_object(),
            operation_name: None,
        }
    }

    /// Set all variables at once. `null` becomes the empty object.
    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = normalize_variables(variables);
        self
    }

    /// Set a single variable value.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let request = GraphQLRequest::new("query($id: ID!) { job(id: $id) { id } }")
    ///     .variable("id", "42");
    /// ```
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if !self.variables.is_object() {
            self.variables = empty_object();
        }
        if let Value::Object(map) = &mut self.variables {
            map.insert(name.into(), value.into());
        }
        self
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Treat `null` variables as the empty mapping.
pub(crate) fn normalize_variables(variables: Value) -> Value {
    match variables {
        Value::Null => empty_object(),
        other => other,
    }
}

/// A request on its way to the transport: payload plus extra headers.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    /// The JSON payload.
    pub body: GraphQLRequest,
    /// Headers added on top of the transport's defaults.
    pub headers: http::HeaderMap,
}

impl OutgoingRequest {
    /// Wrap a payload with no extra headers.
    pub fn new(body: GraphQLRequest) -> Self {
        Self {
            body,
            headers: http::HeaderMap::new(),
        }
    }
}

impl From<GraphQLRequest> for OutgoingRequest {
    fn from(body: GraphQLRequest) -> Self {
        Self::new(body)
    }
}
