//! Transport link.
//!
//! A [`Transport`] sends one composed operation to a single fixed endpoint
//! and returns the decoded [`GraphQLResponse`]. Each call performs exactly
//! one exchange; retrying is left to the caller.
//!
//! [`HttpTransport`] is the production implementation. Tests and embedders
//! can supply their own.

mod http_client;
mod request;
mod response;

use std::future::Future;
use std::sync::Arc;

pub use http_client::{HttpTransport, HttpTransportBuilder, TransportConfig, DEFAULT_ENDPOINT};
pub use request::{GraphQLRequest, OutgoingRequest};
pub use response::{GraphQLError, GraphQLLocation, GraphQLResponse, PathSegment};

pub(crate) use request::normalize_variables;

use crate::error::TransportError;

/// Sends GraphQL requests to the remote service.
pub trait Transport: Send + Sync {
    /// Send one request and wait for the response.
    ///
    /// A response with both `data` and `errors` is returned as `Ok`.
    fn send(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = Result<GraphQLResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = Result<GraphQLResponse, TransportError>> + Send {
        (**self).send(request)
    }
}
