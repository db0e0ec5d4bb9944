//! Client facade.
//!
//! [`Client`] ties the other components together:
//!
//! - `query`: cache read, and on a miss compose → authenticate → send →
//!   write through to the cache.
//! - `mutate`: always compose → authenticate → send, then merge the returned
//!   entities and run the caller's updater.
//!
//! Responses carrying both data and errors are returned as [`Response`]s
//! with a non-empty `errors` list. A response without data fails with
//! [`Error::Graph`], as does decoding a `null` field of a partial response.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{AuthInterceptor, Session};
use crate::cache::{CacheLookup, ResultCache};
use crate::error::{Error, Result};
use crate::logging::targets;
use crate::registry::{FetchPolicy, Operation, OperationKind, OperationRegistry};
use crate::transport::{
    GraphQLError, GraphQLRequest, GraphQLResponse, OutgoingRequest, Transport, normalize_variables,
};

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Rebuilt from the result cache without a network exchange.
    Cache,
    /// Fetched from the service.
    Network,
}

/// The outcome of a query or mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Operation name.
    pub operation: String,
    /// The `data` object.
    pub data: Value,
    /// Non-fatal errors reported alongside the data.
    pub errors: Vec<GraphQLError>,
    /// Where the response came from.
    pub source: ResponseSource,
}

impl Response {
    /// Whether the service reported errors alongside the data.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the response was answered from the cache.
    pub fn from_cache(&self) -> bool {
        self.source == ResponseSource::Cache
    }

    /// Decode one root field of the data.
    ///
    /// A `null` field in a response that carries errors fails with
    /// [`Error::Graph`], since the errors explain why the field is missing.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // { "data": { "job": { "id": "1", "title": "Engineer" } } }
    /// let job: Job = response.field("job")?;
    /// ```
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.data.get(name).ok_or_else(|| Error::MissingField {
            operation: self.operation.clone(),
            field: name.to_string(),
        })?;
        if value.is_null() && self.is_partial() {
            return Err(Error::Graph {
                errors: self.errors.clone(),
            });
        }
        Ok(T::deserialize(value)?)
    }

    /// Decode the whole data object.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.data)?)
    }
}

struct ClientInner<T, S> {
    registry: Arc<OperationRegistry>,
    auth: AuthInterceptor<S>,
    transport: T,
    cache: Arc<ResultCache>,
}

/// GraphQL client with fragment composition, bearer auth and a normalized
/// cache.
///
/// The client is cheaply cloneable; clones share the registry, session,
/// transport and cache.
///
/// # Example
///
/// ```ignore
/// use joblink_graphql::{Client, HttpTransport, SharedSession};
///
/// let client = Client::new(registry, Arc::new(SharedSession::new()), HttpTransport::new(url)?);
///
/// let response = client.query("JobQuery", json!({"id": "1"})).await?;
/// let job: Job = response.field("job")?;
///
/// let created = client
///     .mutate_with("CreateJob", json!({"input": input}), |cache, data| {
///         cache.write_query("JobQuery", &json!({"id": data["job"]["id"]}), data);
///     })
///     .await?;
/// ```
pub struct Client<T, S> {
    inner: Arc<ClientInner<T, S>>,
}

impl<T, S> Clone for Client<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport, S: Session> Client<T, S> {
    /// Create a client with an empty cache.
    pub fn new(registry: impl Into<Arc<OperationRegistry>>, session: S, transport: T) -> Self {
        Self::with_cache(registry, session, transport, Arc::new(ResultCache::new()))
    }

    /// Create a client over an existing cache.
    pub fn with_cache(
        registry: impl Into<Arc<OperationRegistry>>,
        session: S,
        transport: T,
        cache: Arc<ResultCache>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                registry: registry.into(),
                auth: AuthInterceptor::new(session),
                transport,
                cache,
            }),
        }
    }

    /// The operation registry.
    pub fn registry(&self) -> &OperationRegistry {
        &self.inner.registry
    }

    /// The result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.inner.cache
    }

    /// The session consulted for credentials.
    pub fn session(&self) -> &S {
        self.inner.auth.session()
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Run a query, answering from the cache when the operation's fetch
    /// policy allows it.
    pub async fn query(&self, name: &str, variables: Value) -> Result<Response> {
        let operation = self.lookup(name, OperationKind::Query)?;
        let variables = normalize_variables(variables);
        let policy = operation.policy();

        if policy.reads_cache() {
            match self.inner.cache.read(name, &variables) {
                CacheLookup::Hit(data) => {
                    return Ok(Response {
                        operation: name.to_string(),
                        data,
                        errors: Vec::new(),
                        source: ResponseSource::Cache,
                    });
                }
                CacheLookup::Miss if policy == FetchPolicy::CacheOnly => {
                    return Err(Error::CacheMiss(name.to_string()));
                }
                CacheLookup::Miss => {}
            }
        }

        let response = self.dispatch(&operation, variables.clone()).await?;
        let response = into_response(name, response)?;

        if !response.is_partial() {
            if policy.stores_result() {
                self.inner.cache.write_query(name, &variables, &response.data);
            } else {
                self.inner.cache.merge(&response.data);
            }
        }
        Ok(response)
    }

    /// Run a mutation and merge the returned entities into the cache.
    pub async fn mutate(&self, name: &str, variables: Value) -> Result<Response> {
        self.mutate_with(name, variables, |_, _| {}).await
    }

    /// Run a mutation, merge the returned entities, then call `updater`
    /// with the cache and the returned data.
    ///
    /// Neither step runs when the response carries errors.
    pub async fn mutate_with<F>(&self, name: &str, variables: Value, updater: F) -> Result<Response>
    where
        F: FnOnce(&ResultCache, &Value),
    {
        let operation = self.lookup(name, OperationKind::Mutation)?;
        let variables = normalize_variables(variables);

        let response = self.dispatch(&operation, variables).await?;
        let response = into_response(name, response)?;

        if response.is_partial() {
            tracing::debug!(
                target: targets::CLIENT,
                operation = name,
                "mutation returned errors, cache left untouched"
            );
        } else {
            self.inner.cache.write(&response.data, updater);
        }
        Ok(response)
    }

    fn lookup(&self, name: &str, expected: OperationKind) -> Result<Arc<Operation>> {
        let operation = self
            .inner
            .registry
            .operation(name)
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))?;
        if operation.kind() != expected {
            return Err(Error::WrongOperationKind {
                name: name.to_string(),
                expected,
            });
        }
        Ok(Arc::clone(operation))
    }

    /// Compose, authenticate and send one operation.
    async fn dispatch(&self, operation: &Operation, variables: Value) -> Result<GraphQLResponse> {
        let text = self.inner.registry.compose(operation.name())?;
        let body = GraphQLRequest::new(text)
            .variables(variables)
            .operation_name(operation.name());
        let request = self.inner.auth.decorate(OutgoingRequest::new(body));

        tracing::debug!(
            target: targets::CLIENT,
            operation = operation.name(),
            kind = %operation.kind(),
            "dispatching"
        );

        let response = self.inner.transport.send(request).await.inspect_err(|err| {
            tracing::debug!(
                target: targets::CLIENT,
                operation = operation.name(),
                error = %err,
                "transport failed"
            );
        })?;
        Ok(response)
    }
}

/// Split a wire response into data and errors, failing when there is no data.
fn into_response(name: &str, response: GraphQLResponse) -> Result<Response> {
    match response.data {
        Some(data) if !data.is_null() => {
            if !response.errors.is_empty() {
                tracing::debug!(
                    target: targets::CLIENT,
                    operation = name,
                    errors = response.errors.len(),
                    "partial success"
                );
            }
            Ok(Response {
                operation: name.to_string(),
                data,
                errors: response.errors,
                source: ResponseSource::Network,
            })
        }
        _ if !response.errors.is_empty() => Err(Error::Graph {
            errors: response.errors,
        }),
        _ => Err(Error::MissingData(name.to_string())),
    }
}

impl<T, S> std::fmt::Debug for Client<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("operations", &self.inner.registry.operation_count())
            .field("cache", &self.inner.cache)
            .finish()
    }
}
