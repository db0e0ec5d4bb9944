//! HTTP transport built on reqwest.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};

use super::{GraphQLResponse, OutgoingRequest, Transport};
use crate::error::TransportError;
use crate::logging::targets;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9000/graphql";

/// Configuration for the HTTP transport.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// The GraphQL endpoint every request is POSTed to.
    pub endpoint: String,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some(format!("joblink/{} (Rust)", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// Builder for creating an [`HttpTransport`].
pub struct HttpTransportBuilder {
    config: TransportConfig,
    default_headers: HeaderMap,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            config: TransportConfig::default(),
            default_headers: HeaderMap::new(),
        }
    }
}

impl HttpTransportBuilder {
    /// Create a builder for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let mut builder = Self::default();
        builder.config.endpoint = endpoint.into();
        builder
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent with every request.
    pub fn default_header(
        mut self,
        name: impl TryInto<HeaderName>,
        value: impl TryInto<HeaderValue>,
    ) -> Result<Self, TransportError> {
        let name = name
            .try_into()
            .map_err(|_| TransportError::InvalidHeader("Invalid header name".to_string()))?;
        let value = value
            .try_into()
            .map_err(|_| TransportError::InvalidHeader("Invalid header value".to_string()))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport, TransportError> {
        let endpoint = url::Url::parse(&self.config.endpoint)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        let mut headers = self.default_headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        builder = builder.default_headers(headers);

        let client = builder.build()?;

        Ok(HttpTransport {
            inner: Arc::new(HttpTransportInner {
                client,
                endpoint,
                config: self.config,
            }),
        })
    }
}

struct HttpTransportInner {
    client: reqwest::Client,
    endpoint: url::Url,
    config: TransportConfig,
}

/// Sends GraphQL requests as JSON over HTTP POST.
///
/// The transport is cheaply cloneable; clones share one connection pool.
///
/// # Example
///
/// ```ignore
/// use joblink_graphql::transport::HttpTransport;
///
/// let transport = HttpTransport::builder("https://api.example.com/graphql")
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

impl HttpTransport {
    /// Create a transport with default configuration.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        HttpTransportBuilder::new(endpoint).build()
    }

    /// Create a builder for configuring a transport.
    pub fn builder(endpoint: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder::new(endpoint)
    }

    /// The endpoint URL.
    pub fn endpoint(&self) -> &str {
        self.inner.endpoint.as_str()
    }

    /// The transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    async fn execute(&self, request: OutgoingRequest) -> Result<GraphQLResponse, TransportError> {
        let body = serde_json::to_vec(&request.body)?;

        tracing::debug!(
            target: targets::TRANSPORT,
            endpoint = %self.inner.endpoint,
            operation = request.body.operation_name.as_deref().unwrap_or("<anonymous>"),
            bytes = body.len(),
            "sending request"
        );

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .headers(request.headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.ok().filter(|body| !body.is_empty());

            // Validation and variable errors arrive as a 4xx with a GraphQL body.
            if let Some(body) = message.as_deref()
                && let Ok(response) = serde_json::from_str::<GraphQLResponse>(body)
                && response.has_errors()
            {
                tracing::debug!(
                    target: targets::TRANSPORT,
                    status = status.as_u16(),
                    errors = response.errors.len(),
                    "request rejected with GraphQL errors"
                );
                return Ok(response);
            }

            tracing::debug!(target: targets::TRANSPORT, status = status.as_u16(), "request failed");
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        let response: GraphQLResponse = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::InvalidBody(e.to_string()))?;

        tracing::debug!(
            target: targets::TRANSPORT,
            has_data = response.data.is_some(),
            errors = response.errors.len(),
            "received response"
        );
        Ok(response)
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = Result<GraphQLResponse, TransportError>> + Send {
        self.execute(request)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("config", &self.inner.config)
            .finish()
    }
}
